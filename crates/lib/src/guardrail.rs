//! # Read-Only Guardrail
//!
//! Every statement produced by the translator passes through [`check_read_only`]
//! before it reaches the warehouse. The check is layered: a cheap lexical pass
//! (prefix and whole-word denylist) followed by a full parse with `sqlparser`.

use regex::Regex;
use sqlparser::{ast::Statement, dialect::SQLiteDialect, parser::Parser};
use std::sync::LazyLock;
use thiserror::Error;

static FORBIDDEN_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(drop|delete|update|insert|alter|truncate|create|merge|grant|revoke|attach|detach|pragma|vacuum|reindex)\b|\breplace\s+into\b",
    )
    .expect("denylist pattern is valid")
});

/// Why a statement was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardrailViolation {
    #[error("Empty SQL statement")]
    Empty,
    #[error("Only SELECT queries are allowed")]
    NotSelect,
    #[error("Forbidden keyword '{0}' in query")]
    ForbiddenKeyword(String),
    #[error("Query could not be parsed: {0}")]
    Unparseable(String),
    #[error("Expected exactly one statement, found {0}")]
    StatementCount(usize),
    #[error("Statement is not a read-only query")]
    NotAQuery,
}

/// Checks that `sql` is a single read-only `SELECT`/`WITH` query.
pub fn check_read_only(sql: &str) -> Result<(), GuardrailViolation> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(GuardrailViolation::Empty);
    }

    let lowered = trimmed.to_lowercase();
    if !(starts_with_word(&lowered, "select") || starts_with_word(&lowered, "with")) {
        return Err(GuardrailViolation::NotSelect);
    }

    if let Some(found) = FORBIDDEN_KEYWORDS.find(trimmed) {
        let keyword = found
            .as_str()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        return Err(GuardrailViolation::ForbiddenKeyword(keyword));
    }

    let statements = Parser::parse_sql(&SQLiteDialect {}, trimmed)
        .map_err(|e| GuardrailViolation::Unparseable(e.to_string()))?;

    match statements.as_slice() {
        [Statement::Query(_)] => Ok(()),
        [_] => Err(GuardrailViolation::NotAQuery),
        other => Err(GuardrailViolation::StatementCount(other.len())),
    }
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word).is_some_and(|rest| {
        rest.chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}
