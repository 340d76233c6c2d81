//! # sqlsentry Integration Tests
//!
//! End-to-end tests through the public [`Sentry`] facade.
//!
//! ## Coverage
//!
//! | Area | Test |
//! |------|------|
//! | Canonical verdicts | `test_canonical_*` |
//! | Explain output | `test_explain_*` |
//! | Configuration files | `test_config_*` |
//! | Custom catalogs | `test_catalog_*` |

use std::fs;

use sqlsentry_core::{Action, AttackFamily, Sentry, SentryConfig, SentryError, Severity};
use tempfile::TempDir;

fn sentry() -> Sentry {
    Sentry::new(SentryConfig::default()).unwrap()
}

// =============================================================================
// CANONICAL VERDICTS
// =============================================================================

#[test]
fn test_canonical_clean_login() {
    let result = sentry().analyze_payload("username=admin&password=123");
    assert!(!result.detected);
    assert_eq!(result.attack_type, None);
    assert_eq!(result.action, Action::Allow);
}

#[test]
fn test_canonical_quoted_tautology() {
    let result = sentry().analyze_payload("id=1' OR '1'='1");
    assert!(result.detected);
    assert_eq!(result.attack_type, Some(AttackFamily::BooleanBased));
    assert_eq!(result.action, Action::Block);
}

#[test]
fn test_canonical_numeric_tautology() {
    let result = sentry().analyze_payload("id=1' OR 1=1");
    assert_eq!(result.attack_type, Some(AttackFamily::BooleanBased));
    assert_eq!(result.action, Action::Block);
}

#[test]
fn test_canonical_dash_comment() {
    let result = sentry().analyze_payload("admin'--");
    assert_eq!(result.attack_type, Some(AttackFamily::CommentBased));
    assert_eq!(result.action, Action::Block);
}

#[test]
fn test_canonical_hash_comment() {
    let result = sentry().analyze_payload("user'#");
    assert_eq!(result.attack_type, Some(AttackFamily::CommentBased));
    assert_eq!(result.action, Action::Block);
}

// =============================================================================
// EXPLAIN
// =============================================================================

#[test]
fn test_explain_matches_verdict() {
    let sentry = sentry();
    for payload in ["username=admin", "id=1' OR 1=1", "admin'--", "user'#", ""] {
        assert_eq!(sentry.explain(payload).result, sentry.analyze_payload(payload));
    }
}

#[test]
fn test_explain_boolean_attack_end_to_end() {
    let explanation = sentry().explain("id=1' OR 1=1");

    assert_eq!(explanation.tokens.last().unwrap().offset, "id=1' OR 1=1".len());
    assert!(explanation.tree.is_malicious());
    assert_eq!(explanation.detection.severity, Some(Severity::High));
    assert_eq!(explanation.signature_matches.len(), 1);
    assert_eq!(explanation.signature_matches[0].name, "boolean_sqli_2");

    let semantic = explanation.semantic.as_ref().unwrap();
    assert_eq!(semantic.risk.action, Action::Block);
    assert_eq!(semantic.risk.score, 8);
    assert_eq!(semantic.recommendations.len(), 3);

    let execution = explanation.execution.as_ref().unwrap();
    assert_eq!(execution.action, Some(Action::Block));

    assert_eq!(explanation.automata.len(), 2);
    assert_eq!(explanation.automata[0].automaton, "Boolean_DFA");
    assert_eq!(explanation.automata[1].automaton, "Comment_DFA");
}

#[test]
fn test_explain_comment_trace() {
    let explanation = sentry().explain("user'#");
    let comment = &explanation.automata[1];
    assert!(comment.accepted);
    assert_eq!(comment.final_state, "q2");
}

#[test]
fn test_explain_serializes_to_json() {
    let explanation = sentry().explain("admin'--");
    let json = serde_json::to_value(&explanation).unwrap();

    assert_eq!(json["result"]["type"], "COMMENT_BASED");
    assert_eq!(json["result"]["action"], "BLOCK");
    assert_eq!(json["tree"]["kind"]["node"], "PAYLOAD");
    assert_eq!(json["token_summary"]["COMMENT"], 1);
    assert_eq!(json["program"]["instructions"][0]["opcode"], "LOAD");
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn test_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("sqlsentry.json");
    fs::write(
        &path,
        r#"{"pipeline": {"semantic_analysis": false, "trace_automata": false}}"#,
    )
    .unwrap();

    let config = SentryConfig::from_file(&path).unwrap();
    assert!(!config.pipeline.semantic_analysis);
    assert!(config.pipeline.compile_program);

    let explanation = Sentry::new(config).unwrap().explain("admin'--");
    assert!(explanation.semantic.is_none());
    assert!(explanation.automata.is_empty());
    assert!(explanation.program.is_some());
}

#[test]
fn test_config_malformed_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{ pipeline: ").unwrap();

    let err = SentryConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, SentryError::Config(_)));
}

#[test]
fn test_config_does_not_change_verdict() {
    let mut config = SentryConfig::default();
    config.pipeline.semantic_analysis = false;
    config.pipeline.compile_program = false;
    config.pipeline.trace_automata = false;

    let minimal = Sentry::new(config).unwrap();
    let full = sentry();
    for payload in ["id=1' OR 1=1", "hello", "user'#"] {
        assert_eq!(minimal.analyze_payload(payload), full.analyze_payload(payload));
    }
}

// =============================================================================
// CUSTOM CATALOGS
// =============================================================================

#[test]
fn test_catalog_from_file_replaces_builtin() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = temp_dir.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"[
            {"name": "stacked", "pattern": ";\\s*drop\\s+table", "severity": "HIGH",
             "action": "BLOCK", "message": "Stacked DROP TABLE"},
            {"name": "union", "pattern": "union\\s+select", "severity": "MEDIUM",
             "action": "ALERT", "message": "UNION probe"}
        ]"#,
    )
    .unwrap();

    let mut config = SentryConfig::default();
    config.signatures.catalog_path = Some(catalog);
    let sentry = Sentry::new(config).unwrap();

    let listed = sentry.list_signatures();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "stacked");

    let matches = sentry.match_signatures("1; DROP TABLE users");
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].message, "Stacked DROP TABLE");

    // The family detector is unaffected by the catalog: not a supported family.
    assert!(sentry.analyze_payload("1; DROP TABLE users").is_allowed());
}

#[test]
fn test_catalog_missing_file() {
    let mut config = SentryConfig::default();
    config.signatures.catalog_path = Some("/nonexistent/catalog.json".into());
    assert!(matches!(Sentry::new(config), Err(SentryError::Io { .. })));
}

#[test]
fn test_catalog_invalid_pattern() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = temp_dir.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"[{"name": "bad", "pattern": "(", "severity": "LOW", "action": "ALERT", "message": ""}]"#,
    )
    .unwrap();

    let mut config = SentryConfig::default();
    config.signatures.catalog_path = Some(catalog);
    assert!(matches!(Sentry::new(config), Err(SentryError::Catalog(_))));
}

#[test]
fn test_catalog_fingerprint_tracks_contents() {
    let builtin = sentry().catalog_fingerprint();

    let temp_dir = TempDir::new().unwrap();
    let catalog = temp_dir.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"[{"name": "only", "pattern": "'--", "severity": "HIGH", "action": "BLOCK", "message": "x"}]"#,
    )
    .unwrap();
    let mut config = SentryConfig::default();
    config.signatures.catalog_path = Some(catalog);

    assert_ne!(Sentry::new(config).unwrap().catalog_fingerprint(), builtin);
}

#[test]
fn test_catalog_empty_is_allowed() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = temp_dir.path().join("catalog.json");
    fs::write(&catalog, "[]").unwrap();

    let mut config = SentryConfig::default();
    config.signatures.catalog_path = Some(catalog);
    let sentry = Sentry::new(config).unwrap();

    assert!(sentry.list_signatures().is_empty());
    assert!(sentry.match_signatures("admin'--").is_empty());
    // Verdicts come from the family detector, not the catalog.
    assert!(sentry.analyze_payload("admin'--").is_blocked());
}

#[test]
fn test_catalog_relative_to_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let conf_dir = temp_dir.path().join("conf");
    fs::create_dir(&conf_dir).unwrap();
    fs::write(
        conf_dir.join("catalog.json"),
        r#"[{"name": "local", "pattern": "'#", "severity": "HIGH", "action": "BLOCK", "message": "x"}]"#,
    )
    .unwrap();
    let config_path = conf_dir.join("sqlsentry.json");
    fs::write(&config_path, r#"{"signatures": {"catalog_path": "catalog.json"}}"#).unwrap();

    let config = SentryConfig::from_file(&config_path).unwrap();
    let sentry = Sentry::new(config).unwrap();

    let listed = sentry.list_signatures();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "local");
}
