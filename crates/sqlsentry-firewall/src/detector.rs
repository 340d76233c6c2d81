//! First-match attack family detection.
//!
//! A short, ordered list of family patterns is evaluated against the raw
//! payload. Evaluation stops at the **first** pattern that matches: rule
//! order is the policy, there is no longest- or best-match selection. This is
//! the path that drives enforcement in the pipeline.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::models::{AttackFamily, CatalogError, Severity};

/// Family patterns in evaluation order. Whitespace classes also cover the
/// ASCII separators U+001C to U+001F.
const FAMILY_RULES: &[(&str, AttackFamily)] = &[
    (r"'[\s\x1c-\x1f]*(OR|AND)[\s\x1c-\x1f]*'", AttackFamily::BooleanBased),
    (r"(OR|AND)[\s\x1c-\x1f]+1[\s\x1c-\x1f]*=[\s\x1c-\x1f]*1", AttackFamily::BooleanBased),
    (r"'1'[\s\x1c-\x1f]*=[\s\x1c-\x1f]*'1'", AttackFamily::BooleanBased),
    (r"'--", AttackFamily::CommentBased),
    (r"'#", AttackFamily::CommentBased),
];

/// Outcome of [`Detector::detect`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Detection {
    pub detected: bool,
    #[serde(rename = "type")]
    pub family: Option<AttackFamily>,
    pub severity: Option<Severity>,
    /// Text matched by the winning pattern.
    pub matched_text: Option<String>,
}

impl Detection {
    /// A negative result.
    pub fn clean() -> Self {
        Self::default()
    }
}

struct FamilyPattern {
    regex: Regex,
    family: AttackFamily,
    severity: Severity,
}

static BUILTIN: LazyLock<Detector> = LazyLock::new(|| {
    let rules = FAMILY_RULES
        .iter()
        .map(|(pattern, family)| (*pattern, *family, Severity::High));
    Detector::new(rules).expect("built-in family patterns compile")
});

/// Ordered first-match family classifier.
pub struct Detector {
    patterns: Vec<FamilyPattern>,
}

impl Detector {
    /// Compile `(pattern, family, severity)` rules, keeping their order.
    pub fn new<'a, I>(rules: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (&'a str, AttackFamily, Severity)>,
    {
        let patterns = rules
            .into_iter()
            .map(|(pattern, family, severity)| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| FamilyPattern {
                        regex,
                        family,
                        severity,
                    })
                    .map_err(|source| CatalogError::InvalidPattern {
                        name: family.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// The process-wide built-in detector.
    pub fn builtin() -> &'static Detector {
        &BUILTIN
    }

    /// Classify `payload` by the first matching pattern.
    pub fn detect(&self, payload: &str) -> Detection {
        for pattern in &self.patterns {
            if let Some(found) = pattern.regex.find(payload) {
                return Detection {
                    detected: true,
                    family: Some(pattern.family),
                    severity: Some(pattern.severity),
                    matched_text: Some(found.as_str().to_string()),
                };
            }
        }
        Detection::clean()
    }
}

/// Detect with the built-in patterns.
pub fn detect(payload: &str) -> Detection {
    Detector::builtin().detect(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_payload() {
        let result = detect("username=admin");
        assert!(!result.detected);
        assert_eq!(result, Detection::clean());
    }

    #[test]
    fn test_quoted_boolean() {
        let result = detect("id=1' OR '1'='1");
        assert!(result.detected);
        assert_eq!(result.family, Some(AttackFamily::BooleanBased));
        assert_eq!(result.severity, Some(Severity::High));
        assert_eq!(result.matched_text.as_deref(), Some("' OR '"));
    }

    #[test]
    fn test_numeric_boolean() {
        let result = detect("id=1' OR 1=1");
        assert_eq!(result.family, Some(AttackFamily::BooleanBased));
        assert_eq!(result.matched_text.as_deref(), Some("OR 1=1"));
    }

    #[test]
    fn test_comment_markers() {
        let dashes = detect("admin'--");
        assert_eq!(dashes.family, Some(AttackFamily::CommentBased));
        assert_eq!(dashes.severity, Some(Severity::High));

        let hash = detect("user'#");
        assert_eq!(hash.family, Some(AttackFamily::CommentBased));
        assert_eq!(hash.matched_text.as_deref(), Some("'#"));
    }

    #[test]
    fn test_ascii_separator_tautology() {
        let detection = detect("id=1 OR\u{1c}1=1");
        assert_eq!(detection.family, Some(AttackFamily::BooleanBased));
        assert_eq!(detection.matched_text.as_deref(), Some("OR\u{1c}1=1"));
    }

    #[test]
    fn test_first_match_wins() {
        // Both families are present; the boolean rules come first.
        let result = detect("admin'-- ' or 1=1");
        assert_eq!(result.family, Some(AttackFamily::BooleanBased));
    }

    #[test]
    fn test_custom_order_changes_winner() {
        let detector = Detector::new([
            ("'--", AttackFamily::CommentBased, Severity::Medium),
            (r"(OR|AND)\s+1\s*=\s*1", AttackFamily::BooleanBased, Severity::High),
        ])
        .unwrap();
        let result = detector.detect("admin'-- ' or 1=1");
        assert_eq!(result.family, Some(AttackFamily::CommentBased));
        assert_eq!(result.severity, Some(Severity::Medium));
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let result = Detector::new([("[", AttackFamily::CommentBased, Severity::Low)]);
        assert!(matches!(result, Err(CatalogError::InvalidPattern { .. })));
    }
}
