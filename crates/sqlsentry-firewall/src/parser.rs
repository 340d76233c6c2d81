//! # Grammar Parser
//!
//! Builds a classification tree from the token stream.
//!
//! ## Grammar
//!
//! ```text
//!   Payload       → Injection | Safe
//!   Injection     → BooleanAttack | CommentAttack
//!   BooleanAttack → … (OR | AND) … AlwaysTrue …     (any order, anywhere)
//!   CommentAttack → … COMMENT …
//! ```
//!
//! The boolean check runs first; the comment check only runs when it fails.
//! Neither check imposes adjacency between the tokens it looks for. Parsing is
//! total: when nothing matches the root gets a single `Safe` child.
//!
//! ## Tree Shape
//!
//! ```text
//!   PAYLOAD (is_malicious)
//!   └── INJECTION(BOOLEAN_BASED) "' OR 1=1"
//!       ├── QUOTE "'"
//!       ├── KEYWORD "OR"
//!       └── ALWAYS_TRUE "1=1"
//! ```
//!
//! Evidence children under an injection node are diagnostic only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::lexer::{Token, TokenKind};
use crate::models::{AttackFamily, Severity};

/// Role of an evidence node under an injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceKind {
    Quote,
    Keyword,
    AlwaysTrue,
    /// Text preceding a comment marker.
    Prefix,
    Comment,
}

impl EvidenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Quote => "QUOTE",
            EvidenceKind::Keyword => "KEYWORD",
            EvidenceKind::AlwaysTrue => "ALWAYS_TRUE",
            EvidenceKind::Prefix => "PREFIX",
            EvidenceKind::Comment => "COMMENT",
        }
    }
}

/// Node variants of the classification tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// Root. Has exactly one child, `Injection` or `Safe`.
    Payload {
        is_malicious: bool,
        attack: Option<AttackFamily>,
    },
    Injection { family: AttackFamily },
    Safe,
    Evidence { role: EvidenceKind },
}

/// A node of the classification tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub value: String,
    pub children: Vec<Node>,
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    fn new(kind: NodeKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            children: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    fn evidence(role: EvidenceKind, value: &str) -> Self {
        Self::new(NodeKind::Evidence { role }, value)
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// `true` only for a root whose child is an injection.
    pub fn is_malicious(&self) -> bool {
        matches!(self.kind, NodeKind::Payload { is_malicious: true, .. })
    }

    /// Attack family recorded on a root or injection node.
    pub fn attack(&self) -> Option<AttackFamily> {
        match &self.kind {
            NodeKind::Payload { attack, .. } => *attack,
            NodeKind::Injection { family } => Some(*family),
            NodeKind::Safe | NodeKind::Evidence { .. } => None,
        }
    }

    /// Display label for the node kind.
    pub fn label(&self) -> String {
        match &self.kind {
            NodeKind::Payload { .. } => "PAYLOAD".to_string(),
            NodeKind::Injection { family } => format!("INJECTION({})", family),
            NodeKind::Safe => "SAFE".to_string(),
            NodeKind::Evidence { role } => role.as_str().to_string(),
        }
    }

    fn render(&self, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}├── {}: {}", "  ".repeat(depth), self.label(), self.value)?;
        for child in &self.children {
            child.render(depth + 1, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(0, f)
    }
}

/// Token kinds kept in an injection node's reconstructed value.
const RECONSTRUCTED: &[TokenKind] = &[
    TokenKind::Quote,
    TokenKind::Keyword,
    TokenKind::AlwaysTrue,
    TokenKind::Operator,
    TokenKind::Number,
];

/// Grammar checks over a complete token sequence.
pub struct Parser<'a> {
    tokens: &'a [Token],
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens }
    }

    /// Build the classification tree. Never fails.
    pub fn parse(&self) -> Node {
        let injection = self.parse_injection();

        let mut root = Node::new(
            NodeKind::Payload {
                is_malicious: injection.is_some(),
                attack: injection.as_ref().and_then(Node::attack),
            },
            "",
        );
        root.add_child(injection.unwrap_or_else(|| {
            Node::new(NodeKind::Safe, "Input is safe, no attack detected")
        }));
        root
    }

    fn parse_injection(&self) -> Option<Node> {
        if self.is_boolean_attack() {
            return Some(self.parse_boolean_attack());
        }
        if let Some(position) = self.comment_position() {
            return Some(self.parse_comment_attack(position));
        }
        None
    }

    fn find(&self, predicate: impl Fn(&Token) -> bool) -> Option<&'a Token> {
        self.tokens.iter().find(|&t| predicate(t))
    }

    fn is_boolean_attack(&self) -> bool {
        self.find(Token::is_boolean_keyword).is_some()
            && self.find(|t| t.kind == TokenKind::AlwaysTrue).is_some()
    }

    /// Index of the first comment marker, if any.
    fn comment_position(&self) -> Option<usize> {
        self.tokens.iter().position(|t| t.kind == TokenKind::Comment)
    }

    fn injection_node(family: AttackFamily, value: String) -> Node {
        let mut node = Node::new(NodeKind::Injection { family }, value);
        node.metadata.insert("type".to_string(), family.to_string());
        node.metadata
            .insert("severity".to_string(), Severity::High.to_string());
        node
    }

    fn parse_boolean_attack(&self) -> Node {
        let value = self
            .tokens
            .iter()
            .filter(|t| RECONSTRUCTED.contains(&t.kind))
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let mut node = Self::injection_node(AttackFamily::BooleanBased, value);

        if let Some(quote) = self.find(|t| t.kind == TokenKind::Quote) {
            node.add_child(Node::evidence(EvidenceKind::Quote, &quote.text));
        }
        if let Some(keyword) = self.find(Token::is_boolean_keyword) {
            node.add_child(Node::evidence(EvidenceKind::Keyword, &keyword.text));
        }
        if let Some(literal) = self.find(|t| t.kind == TokenKind::AlwaysTrue) {
            node.add_child(Node::evidence(EvidenceKind::AlwaysTrue, &literal.text));
        }
        node
    }

    /// Text of the tokens before `end`, with one space wherever skipped
    /// whitespace separated two tokens.
    fn source_text(&self, end: usize) -> String {
        let mut text = String::new();
        let mut cursor = None;
        for token in &self.tokens[..end] {
            if cursor.is_some_and(|c| token.offset > c) {
                text.push(' ');
            }
            text.push_str(&token.text);
            cursor = Some(token.offset + token.text.len());
        }
        text
    }

    fn parse_comment_attack(&self, position: usize) -> Node {
        let comment = &self.tokens[position];

        let mut node = Self::injection_node(AttackFamily::CommentBased, comment.text.clone());

        node.add_child(Node::evidence(EvidenceKind::Prefix, &self.source_text(position)));
        node.add_child(Node::evidence(EvidenceKind::Comment, &comment.text));
        node
    }
}

/// Parse a token sequence into a classification tree.
pub fn parse(tokens: &[Token]) -> Node {
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use proptest::prelude::*;

    fn tree(input: &str) -> Node {
        parse(&tokenize(input))
    }

    #[test]
    fn test_clean_payload_is_safe() {
        let root = tree("username=admin");
        assert!(!root.is_malicious());
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].kind, NodeKind::Safe);
        assert_eq!(root.attack(), None);
    }

    #[test]
    fn test_boolean_attack() {
        let root = tree("id=1' OR 1=1");
        assert!(root.is_malicious());
        assert_eq!(root.attack(), Some(AttackFamily::BooleanBased));

        let injection = &root.children[0];
        assert_eq!(
            injection.kind,
            NodeKind::Injection {
                family: AttackFamily::BooleanBased
            }
        );
        assert_eq!(injection.value, "= 1 ' OR 1=1");
        assert_eq!(injection.metadata["type"], "BOOLEAN_BASED");
        assert_eq!(injection.metadata["severity"], "HIGH");

        let evidence: Vec<_> = injection.children.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(evidence, vec!["'", "OR", "1=1"]);
    }

    #[test]
    fn test_keyword_and_literal_need_no_adjacency() {
        let root = tree("1=1 then later AND");
        assert_eq!(root.attack(), Some(AttackFamily::BooleanBased));
    }

    #[test]
    fn test_unterminated_quoted_tautology_is_safe_for_grammar() {
        // No ALWAYS_TRUE token forms without the closing quote.
        assert!(!tree("id=1' OR '1'='1").is_malicious());
    }

    #[test]
    fn test_comment_attack() {
        let root = tree("admin'--");
        assert_eq!(root.attack(), Some(AttackFamily::CommentBased));

        let injection = &root.children[0];
        assert_eq!(injection.value, "--");
        assert_eq!(injection.children[0].value, "admin'");
        assert_eq!(
            injection.children[0].kind,
            NodeKind::Evidence {
                role: EvidenceKind::Prefix
            }
        );
        assert_eq!(injection.children[1].value, "--");
    }

    #[test]
    fn test_comment_prefix_keeps_word_breaks() {
        let root = tree("a b'--");
        let prefix = &root.children[0].children[0];
        assert_eq!(prefix.value, "a b'");

        let root = tree("name =  'x' #");
        assert_eq!(root.children[0].children[0].value, "name = 'x'");
    }

    #[test]
    fn test_boolean_takes_precedence_over_comment() {
        let root = tree("x' or 1=1 --");
        assert_eq!(root.attack(), Some(AttackFamily::BooleanBased));
    }

    #[test]
    fn test_empty_token_stream() {
        let root = parse(&[]);
        assert!(!root.is_malicious());
        assert_eq!(root.children[0].kind, NodeKind::Safe);
    }

    #[test]
    fn test_tree_rendering() {
        let rendered = tree("user'#").to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "├── PAYLOAD: ");
        assert_eq!(lines[1], "  ├── INJECTION(COMMENT_BASED): #");
        assert_eq!(lines[2], "    ├── PREFIX: user'");
        assert_eq!(lines[3], "    ├── COMMENT: #");
    }

    proptest! {
        #[test]
        fn prop_exactly_one_classification(input in ".{0,60}") {
            let root = tree(&input);
            prop_assert_eq!(root.children.len(), 1);
            let is_injection = matches!(root.children[0].kind, NodeKind::Injection { .. });
            let is_safe = root.children[0].kind == NodeKind::Safe;
            prop_assert!(is_injection ^ is_safe);
            prop_assert_eq!(root.is_malicious(), is_injection);
        }
    }
}
