//! Verdict types for payload analysis results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use sqlsentry_firewall::{
    Action, AttackFamily, Detection, Execution, Node, Program, SemanticReport, Simulation,
    SignatureMatch, Token, TokenKind,
};

/// The final verdict for one payload.
///
/// `detected`, `type` and `action` come from the first-match detector only.
/// `action` is always `ALLOW` or `BLOCK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub payload: String,
    pub detected: bool,
    #[serde(rename = "type")]
    pub attack_type: Option<AttackFamily>,
    pub action: Action,
}

impl AnalysisResult {
    /// A clean verdict.
    pub fn allow(payload: &str) -> Self {
        Self {
            payload: payload.to_string(),
            detected: false,
            attack_type: None,
            action: Action::Allow,
        }
    }

    /// A blocking verdict for `family`.
    pub fn block(payload: &str, family: AttackFamily) -> Self {
        Self {
            payload: payload.to_string(),
            detected: true,
            attack_type: Some(family),
            action: Action::Block,
        }
    }

    /// Build a verdict from a detector result.
    pub fn from_detection(payload: &str, detection: &Detection) -> Self {
        match detection.family {
            Some(family) if detection.detected => Self::block(payload, family),
            _ => Self::allow(payload),
        }
    }

    /// Returns true if the payload may pass.
    pub fn is_allowed(&self) -> bool {
        self.action == Action::Allow
    }

    /// Returns true if the payload must be rejected.
    pub fn is_blocked(&self) -> bool {
        self.action == Action::Block
    }
}

impl std::fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.attack_type {
            Some(family) if self.detected => {
                write!(f, "{} ({}): {}", self.action, family, self.payload)
            }
            _ => write!(f, "{}: {}", self.action, self.payload),
        }
    }
}

/// Verbose, purely additive view of one analysis.
///
/// Optional sections are `None` when disabled in
/// [`crate::config::PipelineConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub result: AnalysisResult,
    pub tokens: Vec<Token>,
    pub token_summary: BTreeMap<TokenKind, usize>,
    pub tree: Node,
    pub detection: Detection,
    pub signature_matches: Vec<SignatureMatch>,
    pub automata: Vec<Simulation>,
    pub semantic: Option<SemanticReport>,
    pub program: Option<Program>,
    pub execution: Option<Execution>,
}
