//! # Signature Catalog
//!
//! Named attack signatures evaluated directly against the raw payload,
//! independent of tokenization.
//!
//! The catalog is a configuration table: an ordered list of rows
//! `{name, pattern, severity, action, message}`. The built-in table covers the
//! two supported families; operators can load a replacement table from JSON
//! without code changes. Row order is evaluation order and is preserved in
//! every result.
//!
//! ```json
//! [
//!   {"name": "comment_sqli_1", "pattern": "'--", "severity": "HIGH",
//!    "action": "BLOCK", "message": "SQL injection (comment --) detected"}
//! ]
//! ```
//!
//! Patterns are always matched case-insensitively.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::{Action, CatalogError, Severity};

/// One row of the catalog table, as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureSpec {
    pub name: String,
    pub pattern: String,
    pub severity: Severity,
    pub action: Action,
    pub message: String,
}

impl SignatureSpec {
    pub fn new(
        name: &str,
        pattern: &str,
        severity: Severity,
        action: Action,
        message: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            severity,
            action,
            message: message.to_string(),
        }
    }
}

/// A compiled catalog row.
#[derive(Debug, Clone)]
struct Signature {
    spec: SignatureSpec,
    regex: Regex,
}

/// A signature that matched a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMatch {
    pub name: String,
    pub severity: Severity,
    pub action: Action,
    pub message: String,
}

/// Read-only view of a catalog row for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub name: String,
    pub pattern: String,
    pub severity: Severity,
}

/// Built-in rows for the two supported families.
pub fn builtin_specs() -> Vec<SignatureSpec> {
    vec![
        // Boolean-based
        SignatureSpec::new(
            "boolean_sqli_1",
            r"'[\s\x1c-\x1f]*(OR|AND)[\s\x1c-\x1f]*'",
            Severity::High,
            Action::Block,
            "SQL injection (boolean-based) detected",
        ),
        SignatureSpec::new(
            "boolean_sqli_2",
            r"(OR|AND)[\s\x1c-\x1f]+1[\s\x1c-\x1f]*=[\s\x1c-\x1f]*1",
            Severity::High,
            Action::Block,
            "SQL injection (boolean-based 1=1) detected",
        ),
        // Comment-based
        SignatureSpec::new(
            "comment_sqli_1",
            r"'--",
            Severity::High,
            Action::Block,
            "SQL injection (comment --) detected",
        ),
        SignatureSpec::new(
            "comment_sqli_2",
            r"'#",
            Severity::High,
            Action::Block,
            "SQL injection (comment #) detected",
        ),
    ]
}

static BUILTIN: LazyLock<SignatureCatalog> = LazyLock::new(|| {
    SignatureCatalog::from_specs(builtin_specs()).expect("built-in signatures compile")
});

/// Ordered, immutable set of compiled signatures.
#[derive(Debug, Clone)]
pub struct SignatureCatalog {
    signatures: Vec<Signature>,
}

impl SignatureCatalog {
    /// The process-wide built-in catalog.
    pub fn builtin() -> &'static SignatureCatalog {
        &BUILTIN
    }

    /// Compile a catalog from configured rows.
    ///
    /// # Errors
    ///
    /// Fails on an empty name, a duplicate name, or a pattern that does not
    /// compile. Nothing is partially loaded.
    pub fn from_specs(specs: Vec<SignatureSpec>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut signatures = Vec::with_capacity(specs.len());

        for (position, spec) in specs.into_iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(position));
            }
            if !seen.insert(spec.name.clone()) {
                return Err(CatalogError::DuplicateName(spec.name));
            }

            let regex = RegexBuilder::new(&spec.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| CatalogError::InvalidPattern {
                    name: spec.name.clone(),
                    source,
                })?;

            signatures.push(Signature { spec, regex });
        }

        Ok(Self { signatures })
    }

    /// Parse and compile a JSON array of rows.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let specs: Vec<SignatureSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    /// Every signature whose pattern occurs anywhere in `payload`, in
    /// catalog order.
    pub fn match_signatures(&self, payload: &str) -> Vec<SignatureMatch> {
        self.signatures
            .iter()
            .filter(|sig| sig.regex.is_match(payload))
            .map(|sig| SignatureMatch {
                name: sig.spec.name.clone(),
                severity: sig.spec.severity,
                action: sig.spec.action,
                message: sig.spec.message.clone(),
            })
            .collect()
    }

    /// Enumerate the catalog.
    pub fn list(&self) -> Vec<SignatureInfo> {
        self.signatures
            .iter()
            .map(|sig| SignatureInfo {
                name: sig.spec.name.clone(),
                pattern: sig.spec.pattern.clone(),
                severity: sig.spec.severity,
            })
            .collect()
    }

    /// The configured rows, in order.
    pub fn specs(&self) -> impl Iterator<Item = &SignatureSpec> {
        self.signatures.iter().map(|sig| &sig.spec)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// SHA-256 over the ordered rows, hex-encoded.
    ///
    /// Reordering rows changes the fingerprint, since order is evaluation
    /// order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for spec in self.specs() {
            for field in [
                spec.name.as_str(),
                spec.pattern.as_str(),
                spec.severity.as_str(),
                spec.action.as_str(),
                spec.message.as_str(),
            ] {
                hasher.update((field.len() as u64).to_be_bytes());
                hasher.update(field.as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Match against the built-in catalog.
pub fn match_signatures(payload: &str) -> Vec<SignatureMatch> {
    SignatureCatalog::builtin().match_signatures(payload)
}

/// List the built-in catalog.
pub fn list_signatures() -> Vec<SignatureInfo> {
    SignatureCatalog::builtin().list()
}
