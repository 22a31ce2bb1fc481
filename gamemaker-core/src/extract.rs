//! Extracting structured documents from agent text.
//!
//! Agents are prompted to embed a JSON document in their final reply, but
//! the reply usually carries prose around it. This module is the single
//! place that scrapes and validates those documents. Extraction is
//! best-effort: any failure returns `None` (with a warning log) so the
//! caller can fall back to a default document instead of stalling the flow.

use serde::de::DeserializeOwned;
use tracing::warn;

/// Find the first balanced `{...}` block in `text`.
///
/// The scan is aware of JSON strings and escapes, so braces inside string
/// values do not confuse the depth count. Returns `None` when no opening
/// brace exists or the block never closes.
pub fn first_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract and deserialize the first embedded JSON document in `text`.
///
/// `context` names the document kind for the warning log.
pub fn extract_document<T: DeserializeOwned>(text: &str, context: &str) -> Option<T> {
    let Some(block) = first_json_block(text) else {
        warn!(context, "no JSON block found in agent output");
        return None;
    };

    match serde_json::from_str(block) {
        Ok(document) => Some(document),
        Err(e) => {
            warn!(context, error = %e, "embedded JSON did not match schema");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BookAnalysis;

    #[test]
    fn test_finds_bare_object() {
        assert_eq!(first_json_block(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_finds_object_inside_prose() {
        let text = "Here's the analysis you asked for!\n\n{\"a\": {\"b\": 2}}\n\nHope it helps!";
        assert_eq!(first_json_block(text), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"{"note": "curly } brace { soup", "n": 1}"#;
        assert_eq!(first_json_block(text), Some(text));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"note": "she said \"hi\" {", "n": 1}"#;
        assert_eq!(first_json_block(text), Some(text));
    }

    #[test]
    fn test_no_block_returns_none() {
        assert_eq!(first_json_block("no json here"), None);
    }

    #[test]
    fn test_unclosed_block_returns_none() {
        assert_eq!(first_json_block(r#"{"a": 1"#), None);
    }

    #[test]
    fn test_extract_document_success() {
        let text = "Great chat! Here is the final analysis:\n\
                    {\"book\": {\"title\": \"Dragons Love Tacos\", \"author\": \"Adam Rubin\"},\
                    \"plotSummary\": \"Dragons love tacos but not spicy salsa.\"}";
        let analysis: BookAnalysis = extract_document(text, "book analysis").unwrap();
        assert_eq!(analysis.book.title, "Dragons Love Tacos");
        assert_eq!(analysis.plot_summary, "Dragons love tacos but not spicy salsa.");
    }

    #[test]
    fn test_extract_document_no_json() {
        let result: Option<BookAnalysis> = extract_document("just prose", "book analysis");
        assert!(result.is_none());
    }

    #[test]
    fn test_extract_document_malformed_json() {
        // Balanced braces but not valid JSON.
        let result: Option<BookAnalysis> = extract_document("{not json}", "book analysis");
        assert!(result.is_none());
    }
}
