// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Wildcard `Like` patterns
//!
//! `*` matches any run of characters (including none), `?` exactly one.
//! Everything else is literal and compared case-sensitively against the
//! property's indexed form.

use regex::Regex;
use std::fmt;

use super::types::Tokenization;

/// Upper bound on pattern length
pub const MAX_PATTERN_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    TooLong { len: usize },
    ControlCharacter { position: usize },
    Compile(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::TooLong { len } => write!(
                f,
                "pattern is {} characters, limit is {}",
                len, MAX_PATTERN_LEN
            ),
            PatternError::ControlCharacter { position } => {
                write!(f, "control character at position {}", position)
            }
            PatternError::Compile(e) => write!(f, "pattern failed to compile: {}", e),
        }
    }
}

impl std::error::Error for PatternError {}

/// A compiled wildcard pattern
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    source: String,
    regex: Regex,
    lowered: Regex,
}

impl WildcardPattern {
    /// Compile a wildcard pattern
    ///
    /// # Errors
    /// Returns `PatternError` for over-long patterns or control characters
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let len = pattern.chars().count();
        if len > MAX_PATTERN_LEN {
            return Err(PatternError::TooLong { len });
        }
        if let Some(position) = pattern.chars().position(|c| c.is_control()) {
            return Err(PatternError::ControlCharacter { position });
        }

        Ok(Self {
            source: pattern.to_string(),
            regex: to_regex(pattern)?,
            lowered: to_regex(&pattern.to_lowercase())?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Raw case-sensitive match
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Match against a property value under its tokenization.
    ///
    /// `Word` properties are indexed lowercased, so both sides are lowered
    /// before the (case-sensitive) comparison; `Field` properties are
    /// compared verbatim.
    pub fn matches_property(&self, value: &str, tokenization: Tokenization) -> bool {
        match tokenization {
            Tokenization::Field => self.is_match(value),
            Tokenization::Word => self.lowered.is_match(&value.to_lowercase()),
        }
    }
}

fn to_regex(pattern: &str) -> Result<Regex, PatternError> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push_str("(?s)^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            c => expr.push_str(&regex::escape(&c.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).map_err(|e| PatternError::Compile(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_any_run() {
        let p = WildcardPattern::compile("*amazon*").unwrap();
        assert!(p.is_match("amazonhelp"));
        assert!(p.is_match("amazon"));
        assert!(!p.is_match("AmazonHelp"));
    }

    #[test]
    fn test_question_mark_matches_one() {
        let p = WildcardPattern::compile("Delt?").unwrap();
        assert!(p.is_match("Delta"));
        assert!(!p.is_match("Delt"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let p = WildcardPattern::compile("a.b+").unwrap();
        assert!(p.is_match("a.b+"));
        assert!(!p.is_match("axbb"));
    }

    #[test]
    fn test_word_tokenization_lowers_both_sides() {
        let p = WildcardPattern::compile("*amazon*").unwrap();
        assert!(p.matches_property("AmazonHelp", Tokenization::Word));
        assert!(!p.matches_property("AmazonHelp", Tokenization::Field));
        assert!(!p.matches_property("Delta", Tokenization::Word));
    }

    #[test]
    fn test_rejects_control_characters() {
        assert_eq!(
            WildcardPattern::compile("ab\u{0}c").unwrap_err(),
            PatternError::ControlCharacter { position: 2 }
        );
    }

    #[test]
    fn test_rejects_long_patterns() {
        let long = "a".repeat(MAX_PATTERN_LEN + 1);
        assert!(matches!(
            WildcardPattern::compile(&long),
            Err(PatternError::TooLong { .. })
        ));
    }
}
