//! The unified Sentry facade.
//!
//! This module provides the main entry point for sqlsentry. The [`Sentry`]
//! struct sequences the detection stages and assembles the final verdict.

use tracing::{debug, info, warn};

use crate::{
    config::SentryConfig,
    error::SentryError,
    verdict::{AnalysisResult, Explanation},
    Result,
};

use sqlsentry_firewall::{
    automata::{simulate_automaton, AutomatonKind},
    compile, execute, parse, token_summary, tokenize, Detection, Detector, Node,
    SemanticAnalyzer, SignatureCatalog, SignatureInfo, SignatureMatch, Token,
};

/// The sqlsentry detection facade.
///
/// # Pipeline
///
/// 1. Tokenizer
/// 2. Grammar parser
/// 3. First-match detector
/// 4. Optional diagnostics (automata, semantic analysis, instruction program)
///
/// Only step 3 decides the verdict. The grammar path can disagree with it
/// (e.g. an unterminated `'1'='1` is invisible to the grammar but caught by
/// the detector) and that disagreement never changes the action.
///
/// A `Sentry` holds only read-only tables, so one instance can serve
/// concurrent analyses from many threads.
///
/// # Example
///
/// ```rust
/// use sqlsentry_core::{Sentry, SentryConfig};
///
/// let sentry = Sentry::new(SentryConfig::default())?;
///
/// let verdict = sentry.analyze_payload("admin'--");
/// assert!(verdict.is_blocked());
/// # Ok::<(), sqlsentry_core::SentryError>(())
/// ```
pub struct Sentry {
    /// Configuration.
    config: SentryConfig,

    /// Catalog backing signature matching and listing.
    catalog: SignatureCatalog,

    /// Family detector driving the verdict.
    detector: &'static Detector,
}

impl Sentry {
    /// Create a new Sentry with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured catalog file cannot be read or does
    /// not compile.
    pub fn new(config: SentryConfig) -> Result<Self> {
        let catalog = match &config.signatures.catalog_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| SentryError::Io {
                    path: path.clone(),
                    source,
                })?;
                SignatureCatalog::from_json(&raw)?
            }
            None => SignatureCatalog::builtin().clone(),
        };

        if catalog.is_empty() {
            warn!("Signature catalog is empty; signature matching will report nothing");
        }

        info!(
            "Sentry initialized with {} signatures (fingerprint {})",
            catalog.len(),
            catalog.fingerprint()
        );

        Ok(Self {
            config,
            catalog,
            detector: Detector::builtin(),
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &SentryConfig {
        &self.config
    }

    /// Analyze a payload and return the enforcement verdict.
    ///
    /// Never fails; any string, including the empty string, yields a verdict.
    pub fn analyze_payload(&self, payload: &str) -> AnalysisResult {
        self.classify(payload).3
    }

    /// Tokenizer, grammar parser and detector, in that order.
    fn classify(&self, payload: &str) -> (Vec<Token>, Node, Detection, AnalysisResult) {
        let tokens = tokenize(payload);
        debug!("Tokenized payload into {} tokens", tokens.len());

        let tree = parse(&tokens);
        debug!("Grammar classification: {:?}", tree.attack());

        let detection = self.detector.detect(payload);
        let result = AnalysisResult::from_detection(payload, &detection);

        if result.is_blocked() {
            warn!(
                "Blocked payload: {:?} matched {:?}",
                result.attack_type, detection.matched_text
            );
        } else {
            info!("Payload allowed ({} bytes)", payload.len());
        }

        (tokens, tree, detection, result)
    }

    /// Analyze a payload and return every intermediate artifact.
    ///
    /// The embedded verdict is identical to [`Sentry::analyze_payload`].
    pub fn explain(&self, payload: &str) -> Explanation {
        let (tokens, tree, detection, result) = self.classify(payload);

        let signature_matches = self.catalog.match_signatures(payload);
        debug!("{} signature(s) matched", signature_matches.len());

        let pipeline = &self.config.pipeline;

        let automata = if pipeline.trace_automata {
            AutomatonKind::ALL
                .iter()
                .map(|kind| simulate_automaton(payload, *kind))
                .collect()
        } else {
            Vec::new()
        };

        let semantic = pipeline.semantic_analysis.then(|| {
            let report = SemanticAnalyzer::new().analyze(&tree);
            debug!("Semantic risk: {:?}", report.risk);
            report
        });

        let (program, execution) = if pipeline.compile_program {
            let program = compile(&tree);
            let execution = execute(&program);
            debug!(
                "Program of {} instructions resolved to {:?}",
                program.len(),
                execution.action
            );
            (Some(program), Some(execution))
        } else {
            (None, None)
        };

        Explanation {
            result,
            token_summary: token_summary(&tokens),
            tokens,
            tree,
            detection,
            signature_matches,
            automata,
            semantic,
            program,
            execution,
        }
    }

    /// Every catalog signature matching `payload`, in catalog order.
    pub fn match_signatures(&self, payload: &str) -> Vec<SignatureMatch> {
        self.catalog.match_signatures(payload)
    }

    /// Enumerate the active signature catalog.
    pub fn list_signatures(&self) -> Vec<SignatureInfo> {
        self.catalog.list()
    }

    /// Fingerprint of the active signature catalog.
    pub fn catalog_fingerprint(&self) -> String {
        self.catalog.fingerprint()
    }
}
