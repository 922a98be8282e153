//! # Model Reply Decoding
//!
//! Every stage expects the model to answer with a JSON document, and every stage
//! has to survive when it does not. This module is the single place where replies
//! are cleaned and decoded, so the fallback behavior of all stages can be audited
//! together.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use tracing::{debug, warn};

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```([\s\S]*?)```").expect("fence pattern is valid"));

// A language tag alone on the opening line, e.g. "sql\n".
static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]+)[ \t]*\r?\n").expect("tag line pattern is valid")
});

// A well-known tag followed by code on the same line, e.g. "sql SELECT 1".
static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:sql|sqlite|json)[ \t]+").expect("inline tag pattern is valid")
});

// Keywords that can open a statement and must never be taken for a tag.
const STATEMENT_HEADS: &[&str] = &["select", "with"];

/// Drops the language tag at the start of a fence body, if there is one.
fn strip_fence_tag(body: &str) -> &str {
    if let Some(caps) = TAG_LINE.captures(body) {
        let tag = caps[1].to_ascii_lowercase();
        if !STATEMENT_HEADS.contains(&tag.as_str()) {
            return &body[caps[0].len()..];
        }
        return body;
    }
    match INLINE_TAG.find(body) {
        Some(m) => &body[m.end()..],
        None => body,
    }
}

/// Removes Markdown code fences around a reply.
///
/// If the reply contains a fenced block, the content of the first block is
/// returned. Stray fence markers (e.g. an unterminated opening fence) are
/// removed. Only a real language tag is dropped with the fence: code that
/// starts right after the backticks is kept whole. The result is trimmed.
pub fn strip_code_fences(text: &str) -> String {
    if let Some(body) = FENCED_BLOCK.captures(text).and_then(|caps| caps.get(1)) {
        return strip_fence_tag(body.as_str()).trim().to_string();
    }

    let trimmed = text.trim();
    let without_open = match trimmed.strip_prefix("```") {
        Some(rest) => strip_fence_tag(rest),
        None => trimmed,
    };
    without_open.trim_end_matches("```").trim().to_string()
}

/// Returns the first balanced JSON object or array in `text`, if any.
///
/// Models often wrap their JSON in prose ("Here is the result: {...}"). The scan
/// respects string literals so braces inside strings do not confuse it.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decodes a model reply into `T`.
///
/// Code fences are stripped first; if the remainder is not valid JSON, the first
/// embedded JSON object or array is tried.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(err) => match extract_json(&cleaned) {
            Some(candidate) if candidate.len() != cleaned.len() => {
                debug!("Retrying decode on embedded JSON fragment.");
                serde_json::from_str(candidate)
            }
            _ => Err(err),
        },
    }
}

/// Decodes a model reply into `T`, substituting `fallback` when it cannot be decoded.
pub fn try_decode<T: DeserializeOwned>(text: &str, fallback: T) -> T {
    match decode(text) {
        Ok(value) => value,
        Err(err) => {
            warn!("Model reply could not be decoded ({err}). Using fallback.");
            debug!(reply = %text, "Undecodable model reply");
            fallback
        }
    }
}
