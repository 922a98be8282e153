//! # Reply Decoding Tests
//!
//! Verifies that model replies are cleaned and decoded the same way for every
//! stage, and that undecodable replies fall back instead of failing.

use insightql::decode::{decode, extract_json, strip_code_fences, try_decode};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Verdict {
    ok: bool,
}

#[test]
fn test_strip_code_fences_variants() {
    assert_eq!(strip_code_fences("```sql\nSELECT 1\n```"), "SELECT 1");
    assert_eq!(strip_code_fences("```\nSELECT 2\n```"), "SELECT 2");
    assert_eq!(strip_code_fences("  SELECT 3  "), "SELECT 3");
    assert_eq!(
        strip_code_fences("Here you go:\n```json\n{\"ok\": true}\n```\nAnything else?"),
        "{\"ok\": true}"
    );
    // An unterminated opening fence is still removed.
    assert_eq!(strip_code_fences("```sql\nSELECT 4"), "SELECT 4");
    // Without a tag, the first keyword belongs to the query.
    assert_eq!(
        strip_code_fences("```SELECT product_name FROM products LIMIT 5```"),
        "SELECT product_name FROM products LIMIT 5"
    );
    assert_eq!(strip_code_fences("```select 1"), "select 1");
    assert_eq!(
        strip_code_fences("```SELECT\n  product_name\nFROM products\n```"),
        "SELECT\n  product_name\nFROM products"
    );
    assert_eq!(
        strip_code_fences("```WITH\nt AS (SELECT 1) SELECT * FROM t```"),
        "WITH\nt AS (SELECT 1) SELECT * FROM t"
    );
    assert_eq!(strip_code_fences("```sql SELECT 5```"), "SELECT 5");
    assert_eq!(strip_code_fences("```SQLite\nSELECT 6\n```"), "SELECT 6");
}

#[test]
fn test_extract_json_respects_strings() {
    let text = r#"Result: {"label": "a } tricky { value", "n": [1, 2]} trailing"#;
    assert_eq!(
        extract_json(text),
        Some(r#"{"label": "a } tricky { value", "n": [1, 2]}"#)
    );
    assert_eq!(extract_json("no json here"), None);
}

#[test]
fn test_decode_handles_fences_and_prose() {
    let fenced: Verdict = decode("```json\n{\"ok\": true}\n```").unwrap();
    assert_eq!(fenced, Verdict { ok: true });

    let wrapped: Verdict = decode("Sure! {\"ok\": false} Hope that helps.").unwrap();
    assert_eq!(wrapped, Verdict { ok: false });

    assert!(decode::<Verdict>("definitely not json").is_err());
}

#[test]
fn test_try_decode_uses_fallback() {
    let decoded = try_decode("{\"ok\": true}", Verdict { ok: false });
    assert_eq!(decoded, Verdict { ok: true });

    let fallback = try_decode("I am not JSON", Verdict { ok: false });
    assert_eq!(fallback, Verdict { ok: false });

    let optional: Option<Verdict> = try_decode("{\"unexpected\": 1}", None);
    assert_eq!(optional, None);
}
