//! # sqlsentry Firewall - SQL Injection Detection Stages
//!
//! The detection stages behind the sqlsentry pipeline. Each stage is a pure,
//! total function over its input; shared state is limited to read-only tables
//! (token rules, signature catalog, family patterns, automata) compiled once
//! per process.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     DETECTION STAGES                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   payload ──┬──▶ LEXER ──▶ PARSER ──▶ tree ──┬──▶ SEMANTIC      │
//! │             │    tokens    grammar           │    issues, risk  │
//! │             │                                │                  │
//! │             │                                └──▶ IR            │
//! │             │                                     compile, run  │
//! │             │                                                   │
//! │             ├──▶ DETECTOR    first-match family  ──▶ verdict    │
//! │             ├──▶ SIGNATURES  all catalog matches                │
//! │             └──▶ AUTOMATA    diagnostic traces                  │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the detector drives enforcement. The grammar path and everything
//! downstream of it is diagnostic.
//!
//! ## Usage
//!
//! ```rust
//! use sqlsentry_firewall::{detect, parse, tokenize, AttackFamily};
//!
//! let payload = "id=1' OR 1=1";
//!
//! let detection = detect(payload);
//! assert_eq!(detection.family, Some(AttackFamily::BooleanBased));
//!
//! let tree = parse(&tokenize(payload));
//! assert!(tree.is_malicious());
//! ```
//!
//! ## References
//!
//! - OWASP SQL Injection Prevention Cheat Sheet:
//!   <https://cheatsheetseries.owasp.org/cheatsheets/SQL_Injection_Prevention_Cheat_Sheet.html>

pub mod automata;
pub mod detector;
pub mod ir;
pub mod lexer;
pub mod models;
pub mod parser;
pub mod semantic;
pub mod signatures;

pub use automata::{simulate_automaton, AutomatonKind, Dfa, Simulation};
pub use detector::{detect, Detection, Detector};
pub use ir::{compile, execute, Execution, Instruction, Opcode, Program};
pub use lexer::{token_summary, tokenize, Lexer, Token, TokenKind};
pub use models::{Action, AttackFamily, AutomatonError, CatalogError, Severity};
pub use parser::{parse, Node, NodeKind};
pub use semantic::{analyze, IssueLevel, RiskAssessment, SemanticAnalyzer, SemanticIssue, SemanticReport};
pub use signatures::{
    list_signatures, match_signatures, SignatureCatalog, SignatureInfo, SignatureMatch,
    SignatureSpec,
};
