//! Semantic analysis of the classification tree.
//!
//! Walks every node in pre-order, records diagnostic issues and symbol facts,
//! then derives a risk assessment and remediation advice.
//!
//! Risk is a step function, not a weighted score: any `Error` issue yields
//! `HIGH / 8 / BLOCK`, otherwise `LOW / 1 / ALLOW`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Action, Severity};
use crate::parser::{Node, NodeKind};

/// Diagnostic level of a [`SemanticIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticIssue {
    pub level: IssueLevel,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: Severity,
    pub score: u8,
    pub action: Action,
}

impl RiskAssessment {
    pub const HIGH: RiskAssessment = RiskAssessment {
        level: Severity::High,
        score: 8,
        action: Action::Block,
    };

    pub const LOW: RiskAssessment = RiskAssessment {
        level: Severity::Low,
        score: 1,
        action: Action::Allow,
    };
}

/// Output of [`SemanticAnalyzer::analyze`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticReport {
    pub issues: Vec<SemanticIssue>,
    pub risk: RiskAssessment,
    pub recommendations: Vec<String>,
    /// Facts collected during the walk (`is_malicious`, `attack_type`, `pattern`).
    pub symbols: BTreeMap<String, String>,
}

impl SemanticReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.level == IssueLevel::Error)
    }
}

const RECOMMENDATIONS: [&str; 3] = [
    "Use parameterized queries / prepared statements",
    "Validate and sanitize all user input",
    "Apply the principle of least privilege to database accounts",
];

/// Tree walker. State is reset at the start of every [`analyze`](Self::analyze).
#[derive(Debug, Default)]
pub struct SemanticAnalyzer {
    issues: Vec<SemanticIssue>,
    symbols: BTreeMap<String, String>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&mut self, tree: &Node) -> SemanticReport {
        self.issues.clear();
        self.symbols.clear();

        self.visit(tree);

        let has_errors = self.issues.iter().any(|i| i.level == IssueLevel::Error);
        let (risk, recommendations) = if has_errors {
            (
                RiskAssessment::HIGH,
                RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
            )
        } else {
            (RiskAssessment::LOW, Vec::new())
        };

        SemanticReport {
            issues: std::mem::take(&mut self.issues),
            risk,
            recommendations,
            symbols: std::mem::take(&mut self.symbols),
        }
    }

    fn visit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Payload {
                is_malicious,
                attack,
            } => {
                self.symbols
                    .insert("is_malicious".to_string(), is_malicious.to_string());
                if *is_malicious {
                    let attack = attack.map(|a| a.to_string()).unwrap_or_default();
                    self.issue(
                        IssueLevel::Warning,
                        format!("Malicious payload detected: {}", attack),
                        Severity::High,
                    );
                }
            }
            NodeKind::Injection { family } => {
                self.issue(
                    IssueLevel::Error,
                    format!("SQL injection ({}) detected", family),
                    Severity::High,
                );
                self.symbols
                    .insert("attack_type".to_string(), family.to_string());
                self.symbols.insert("pattern".to_string(), node.value.clone());
            }
            NodeKind::Safe => {
                self.issue(
                    IssueLevel::Info,
                    "Input is safe, no attack detected".to_string(),
                    Severity::Low,
                );
            }
            NodeKind::Evidence { .. } => {}
        }

        for child in &node.children {
            self.visit(child);
        }
    }

    fn issue(&mut self, level: IssueLevel, message: String, severity: Severity) {
        self.issues.push(SemanticIssue {
            level,
            message,
            severity,
        });
    }
}

/// Analyze a tree with a fresh analyzer.
pub fn analyze(tree: &Node) -> SemanticReport {
    SemanticAnalyzer::new().analyze(tree)
}
