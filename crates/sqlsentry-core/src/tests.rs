//! Unit tests for sqlsentry-core.

#[test]
fn test_crate_structure() {
    // Smoke test - verifies the public surface is reachable from the root
    use crate::{AnalysisResult, AttackFamily, PipelineConfig, SentryConfig};

    let _config = SentryConfig::default();
    let _pipeline = PipelineConfig::default();
    let _allow = AnalysisResult::allow("x");
    let _block = AnalysisResult::block("x'#", AttackFamily::CommentBased);
}

#[test]
fn test_sentry_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<crate::Sentry>();
}
