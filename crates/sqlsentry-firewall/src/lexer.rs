//! # Payload Tokenizer
//!
//! Converts a raw request payload into an ordered stream of typed tokens for
//! the grammar parser.
//!
//! ## Matching Policy
//!
//! At each scan position the token rules are tried **in declaration order**
//! and the first rule that matches wins. This is priority matching, not
//! longest match: keywords and always-true literals sit ahead of the generic
//! number/identifier rules so that `1=1` becomes a single
//! [`TokenKind::AlwaysTrue`] token instead of `NUMBER OPERATOR NUMBER`.
//!
//! ```text
//!   "id=1' OR 1=1"
//!    │  │││  │  │
//!    │  │││  │  └── ALWAYS_TRUE "1=1"
//!    │  │││  └───── KEYWORD "OR"
//!    │  ││└──────── QUOTE "'"
//!    │  │└───────── NUMBER "1"
//!    │  └────────── OPERATOR "="
//!    └───────────── IDENTIFIER "id"
//! ```
//!
//! Whitespace is recognized so the scan can advance, but never emitted.
//! Characters no rule accepts become one-character [`TokenKind::Unknown`]
//! tokens, so tokenization is total. A terminal [`TokenKind::Eof`] token is
//! always appended at the final offset.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Kinds of tokens recognized in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// `OR`, `AND`, `SELECT`, `FROM`, `WHERE`
    Keyword,
    /// `'1'='1'` or `1=1`
    AlwaysTrue,
    /// `--` or `#`
    Comment,
    /// `'` or `"`
    Quote,
    /// `=`, `<`, `>`
    Operator,
    Number,
    Identifier,
    /// Consumed during the scan, never emitted.
    Whitespace,
    /// `& ? + - * / % , .`
    SpecialChar,
    /// A single character no rule accepted.
    Unknown,
    /// End-of-input marker.
    Eof,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Keyword => "KEYWORD",
            TokenKind::AlwaysTrue => "ALWAYS_TRUE",
            TokenKind::Comment => "COMMENT",
            TokenKind::Quote => "QUOTE",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Number => "NUMBER",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::SpecialChar => "SPECIAL_CHAR",
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::Eof => "EOF",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token produced by the [`Lexer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source text covered by the token.
    pub text: String,
    /// Byte offset of the first character in the payload.
    pub offset: usize,
}

impl Token {
    fn new(kind: TokenKind, text: &str, offset: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            offset,
        }
    }

    /// Whether this is a boolean connective (`OR`/`AND`, any case).
    pub fn is_boolean_keyword(&self) -> bool {
        self.kind == TokenKind::Keyword
            && (self.text.eq_ignore_ascii_case("OR") || self.text.eq_ignore_ascii_case("AND"))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({}, '{}')", self.kind, self.text)
    }
}

/// Token rules in priority order.
///
/// Whitespace classes also cover the ASCII separators U+001C to U+001F.
const TOKEN_RULES: &[(TokenKind, &str)] = &[
    (TokenKind::Keyword, r"\b(OR|AND|SELECT|FROM|WHERE)\b"),
    (TokenKind::AlwaysTrue, r"('1'[\s\x1c-\x1f]*=[\s\x1c-\x1f]*'1'|1[\s\x1c-\x1f]*=[\s\x1c-\x1f]*1)"),
    (TokenKind::Comment, r"(--|#)"),
    (TokenKind::Quote, r#"['"]"#),
    (TokenKind::Operator, r"(=|<|>)"),
    (TokenKind::Number, r"\b\d+\b"),
    (TokenKind::Identifier, r"\b[a-zA-Z_][a-zA-Z0-9_]*\b"),
    (TokenKind::Whitespace, r"[\s\x1c-\x1f]+"),
    (TokenKind::SpecialChar, r"[&?+\-*/%,.]"),
];

static SHARED: LazyLock<Lexer> = LazyLock::new(Lexer::new);

/// Priority-ordered regex tokenizer.
///
/// Holds only compiled rules, so a single instance can be shared freely
/// between threads.
pub struct Lexer {
    rules: Vec<(TokenKind, Regex)>,
}

impl Lexer {
    /// Compile the built-in token rules.
    pub fn new() -> Self {
        let rules = TOKEN_RULES
            .iter()
            .map(|(kind, pattern)| {
                // Anchor every rule at the scan position.
                let anchored = format!(r"(?i)^(?:{})", pattern);
                (*kind, Regex::new(&anchored).expect("built-in token rule compiles"))
            })
            .collect();
        Self { rules }
    }

    /// Process-wide lexer, compiled on first use.
    pub fn shared() -> &'static Lexer {
        &SHARED
    }

    /// Tokenize `input`. Never fails.
    pub fn tokenize(&self, input: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0;

        while position < input.len() {
            let remaining = &input[position..];

            match self.match_rule(remaining) {
                Some((kind, len)) => {
                    if kind != TokenKind::Whitespace {
                        tokens.push(Token::new(kind, &remaining[..len], position));
                    }
                    position += len;
                }
                None => {
                    // Non-empty by the loop condition.
                    let len = remaining.chars().next().map_or(1, char::len_utf8);
                    tokens.push(Token::new(TokenKind::Unknown, &remaining[..len], position));
                    position += len;
                }
            }
        }

        tokens.push(Token::new(TokenKind::Eof, "", position));
        tokens
    }

    /// First rule matching at the start of `remaining`, with its length.
    fn match_rule(&self, remaining: &str) -> Option<(TokenKind, usize)> {
        self.rules.iter().find_map(|(kind, regex)| {
            regex
                .find(remaining)
                .filter(|m| !m.is_empty())
                .map(|m| (*kind, m.end()))
        })
    }
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenize with the shared lexer.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::shared().tokenize(input)
}

/// Count tokens per kind.
pub fn token_summary(tokens: &[Token]) -> BTreeMap<TokenKind, usize> {
    let mut summary = BTreeMap::new();
    for token in tokens {
        *summary.entry(token.kind).or_insert(0) += 1;
    }
    summary
}
