//! Read-only safety gate for model-generated SQL
//!
//! The translator is untrusted input. This check is lexical, not a parser:
//! the candidate must start with `select`, and no mutating keyword may follow
//! a `;` (after optional whitespace). A separator and keyword inside a string
//! literal is rejected too, and a keyword hidden behind a comment after the
//! separator is not caught. That rule is the contract.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

const READ_ONLY_KEYWORD: &str = "select";

fn stacked_mutation() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i);\s*(drop|insert|delete|update|create|alter)")
            .expect("stacked mutation pattern is valid")
    })
}

/// True when `candidate` is a single read-only statement by the lexical rule
pub fn is_read_only(candidate: &str) -> bool {
    let cleaned = candidate.trim().to_lowercase();
    cleaned.starts_with(READ_ONLY_KEYWORD) && !stacked_mutation().is_match(&cleaned)
}

/// A statement that passed [`is_read_only`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery(String);

impl ValidatedQuery {
    /// Returns `None` when the statement fails the read-only check
    pub fn new(statement: &str) -> Option<Self> {
        is_read_only(statement).then(|| Self(statement.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
