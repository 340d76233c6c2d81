//! # Core Types for the Detection Stages
//!
//! This module defines the shared vocabulary of the firewall: attack families,
//! severities, enforcement actions, and the errors raised while building the
//! read-only tables (signature catalog, automata).
//!
//! ## Threat Model
//!
//! The catalog is closed. Two SQL injection families are recognized:
//!
//! | Family | Example | Detected by |
//! |--------|---------|-------------|
//! | `BooleanBased` | `id=1' OR 1=1` | Tautology after a boolean keyword |
//! | `CommentBased` | `admin'--` | Quote followed by a comment terminator |
//!
//! Anything else is treated as benign. New families require new catalog
//! entries; nothing here generalizes on its own.
//!
//! ## References
//!
//! - OWASP SQL Injection: <https://owasp.org/www-community/attacks/SQL_Injection>
//! - CWE-89: <https://cwe.mitre.org/data/definitions/89.html>

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// SQL injection families the firewall can classify.
///
/// Serialized as `BOOLEAN_BASED` / `COMMENT_BASED` so reports stay stable
/// across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackFamily {
    /// Tautology injection such as `' OR '1'='1` or `OR 1=1`.
    ///
    /// Turns a `WHERE` clause into an always-true predicate.
    BooleanBased,

    /// Comment-terminator injection such as `admin'--` or `user'#`.
    ///
    /// Closes the string literal and comments out the rest of the query.
    CommentBased,
}

impl AttackFamily {
    /// Stable identifier used in reports and instruction operands.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackFamily::BooleanBased => "BOOLEAN_BASED",
            AttackFamily::CommentBased => "COMMENT_BASED",
        }
    }
}

impl fmt::Display for AttackFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to signatures, detections and risk levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enforcement action.
///
/// The pipeline verdict only ever carries `Allow` or `Block`. `Alert` exists
/// for signature rows that should be reported without blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Allow,
    Alert,
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "ALLOW",
            Action::Alert => "ALERT",
            Action::Block => "BLOCK",
        }
    }

    /// Returns `true` for [`Action::Block`].
    #[inline]
    pub fn is_block(&self) -> bool {
        matches!(self, Action::Block)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while compiling a signature catalog or detector table.
///
/// These only occur at construction time. Once a catalog exists, matching is
/// total over any input string.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A row's pattern is not a valid regular expression.
    #[error("Invalid pattern for signature '{name}': {source}")]
    InvalidPattern {
        /// Name of the offending row
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Two rows share the same name.
    #[error("Duplicate signature name: {0}")]
    DuplicateName(String),

    /// A row has an empty or whitespace-only name.
    #[error("Signature at position {0} has an empty name")]
    EmptyName(usize),

    /// The catalog document could not be parsed.
    #[error("Malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors raised while building a finite automaton.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutomatonError {
    /// No start state was declared.
    #[error("Automaton '{0}' has no start state")]
    MissingStart(String),

    /// A transition or the start/accepting set names an undeclared state.
    #[error("Automaton '{automaton}' references unknown state '{state}'")]
    UnknownState { automaton: String, state: String },
}
