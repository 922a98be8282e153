//! # Prompt Template Modules
//!
//! This module organizes the prompt templates used by the pipeline stages.
//! Templates use `{name}` placeholders which are filled in by [`render`].

pub mod tasks;

use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// Replaces every `{name}` placeholder in `template` with its value.
///
/// Substitution happens in a single pass over the template: a value that
/// itself contains `{name}` text is inserted verbatim. Placeholders without a
/// value are left untouched, so literal braces in a template (e.g. JSON
/// examples) survive rendering.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            vars.iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
