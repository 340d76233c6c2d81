//! # sqlsentry Core
//!
//! Pipeline facade for the sqlsentry SQL injection detector.
//! Orchestrates the detection stages of `sqlsentry-firewall` and assembles the
//! final verdict.
//!
//! ## Threat Coverage
//!
//! | Family | Example | Verdict |
//! |--------|---------|---------|
//! | Boolean-based | `id=1' OR '1'='1`, `id=1' OR 1=1` | BLOCK |
//! | Comment-based | `admin'--`, `user'#` | BLOCK |
//! | Anything else | `username=admin` | ALLOW |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      SQLSENTRY CORE                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │                    ┌─────────────────┐                          │
//! │                    │     Sentry      │  ← Unified Facade        │
//! │                    └────────┬────────┘                          │
//! │                             │                                   │
//! │      ┌──────────────┬───────┴───────┬──────────────┐            │
//! │      ▼              ▼               ▼              ▼            │
//! │  ┌────────┐    ┌─────────┐    ┌──────────┐   ┌───────────┐      │
//! │  │ Lexer  │ ─▶ │ Parser  │    │ Detector │   │ Semantic  │      │
//! │  │        │    │         │    │ (verdict)│   │ IR, DFAs  │      │
//! │  └────────┘    └─────────┘    └──────────┘   └───────────┘      │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use sqlsentry_core::{Sentry, SentryConfig};
//!
//! let sentry = Sentry::new(SentryConfig::default())?;
//!
//! let verdict = sentry.analyze_payload("id=1' OR 1=1");
//! assert!(verdict.is_blocked());
//!
//! // Same verdict, plus tokens, tree, traces, risk report and program.
//! let explanation = sentry.explain("id=1' OR 1=1");
//! assert_eq!(explanation.result, verdict);
//! # Ok::<(), sqlsentry_core::SentryError>(())
//! ```
//!
//! ## Notes
//!
//! - Analysis never fails; only construction (catalog/config loading) can
//! - No state survives between analyses
//! - The verdict comes from the first-match detector, never from the grammar
//!   or the semantic risk score

mod config;
mod error;
mod sentry;
mod verdict;

pub use config::{PipelineConfig, SentryConfig, SignatureConfig};
pub use error::SentryError;
pub use sentry::Sentry;
pub use verdict::{AnalysisResult, Explanation};

// Re-export component types for convenience
pub use sqlsentry_firewall::{Action, AttackFamily, Severity, SignatureInfo, SignatureMatch};

/// Core result type for sentry operations.
pub type Result<T> = std::result::Result<T, SentryError>;

#[cfg(test)]
mod tests;
