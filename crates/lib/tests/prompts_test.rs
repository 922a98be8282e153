//! # Prompt Rendering Tests

use insightql::prompts::{render, tasks};

#[test]
fn test_values_are_not_expanded_again() {
    let rendered = render(
        "Q: {query}\nS: {schema}",
        &[("query", "what is {schema}?"), ("schema", "TABLES")],
    );

    assert_eq!(rendered, "Q: what is {schema}?\nS: TABLES");
}

#[test]
fn test_unknown_placeholders_and_json_braces_survive() {
    let rendered = render(
        r#"Reply with {"ok": true} for {query} in {dialect}"#,
        &[("query", "sales")],
    );

    assert_eq!(rendered, r#"Reply with {"ok": true} for sales in {dialect}"#);
}

#[test]
fn test_repeated_placeholders_are_all_filled() {
    assert_eq!(render("{a}-{a}", &[("a", "x")]), "x-x");
}

#[test]
fn test_translation_prompt_steers_pattern_matching_to_like() {
    let rendered = render(tasks::SQL_TRANSLATION_SYSTEM_PROMPT, &[("dialect", "SQLite SQL")]);

    assert!(rendered.contains("read-only SQLite SQL query"));
    assert!(rendered.contains("Use LIKE for text pattern matching"));
    assert!(rendered.contains("Never use GLOB"));
}
