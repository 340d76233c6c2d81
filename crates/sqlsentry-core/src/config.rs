//! Configuration types for sqlsentry.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SentryError;

/// Configuration for the [`crate::Sentry`] facade.
///
/// Nothing in here can change the verdict of
/// [`crate::Sentry::analyze_payload`]. It selects which diagnostic stages run
/// during `explain` and which catalog backs signature matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentryConfig {
    /// Diagnostic stage toggles.
    pub pipeline: PipelineConfig,

    /// Signature catalog source.
    pub signatures: SignatureConfig,
}

impl SentryConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    ///
    /// A relative `signatures.catalog_path` is resolved against the directory
    /// holding the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SentryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SentryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|e| SentryError::Config(format!("{}: {}", path.display(), e)))?;

        let resolved = match (&config.signatures.catalog_path, path.parent()) {
            (Some(catalog), Some(dir)) if catalog.is_relative() => Some(dir.join(catalog)),
            _ => None,
        };
        if resolved.is_some() {
            config.signatures.catalog_path = resolved;
        }
        Ok(config)
    }
}

/// Which auxiliary stages `explain` runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run the semantic analyzer.
    pub semantic_analysis: bool,

    /// Compile the tree to a program and execute it.
    pub compile_program: bool,

    /// Simulate both illustrative automata.
    pub trace_automata: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            semantic_analysis: true,
            compile_program: true,
            trace_automata: true,
        }
    }
}

/// Signature catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// JSON catalog replacing the built-in one. `None` uses the built-in rows.
    pub catalog_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SentryConfig::default();
        assert!(config.pipeline.semantic_analysis);
        assert!(config.pipeline.compile_program);
        assert!(config.pipeline.trace_automata);
        assert!(config.signatures.catalog_path.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = SentryConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SentryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: SentryConfig =
            serde_json::from_str(r#"{"pipeline": {"compile_program": false}}"#).unwrap();
        assert!(!parsed.pipeline.compile_program);
        assert!(parsed.pipeline.semantic_analysis);
        assert!(parsed.signatures.catalog_path.is_none());
    }

    #[test]
    fn test_relative_catalog_path_follows_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("sqlsentry.json");
        std::fs::write(&path, r#"{"signatures": {"catalog_path": "rules/catalog.json"}}"#)
            .unwrap();

        let config = SentryConfig::from_file(&path).unwrap();
        assert_eq!(
            config.signatures.catalog_path,
            Some(temp_dir.path().join("rules/catalog.json"))
        );
    }

    #[test]
    fn test_absolute_catalog_path_is_kept() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("sqlsentry.json");
        let catalog = temp_dir.path().join("elsewhere.json");
        let raw = serde_json::json!({"signatures": {"catalog_path": catalog}});
        std::fs::write(&path, raw.to_string()).unwrap();

        let config = SentryConfig::from_file(&path).unwrap();
        assert_eq!(config.signatures.catalog_path, Some(catalog));
    }

    #[test]
    fn test_missing_file() {
        let err = SentryConfig::from_file("/nonexistent/sqlsentry.json").unwrap_err();
        assert!(matches!(err, SentryError::Io { .. }));
    }
}
