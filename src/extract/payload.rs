use serde_json::Value;

use crate::error::{InvoiceError, Result};

/// Find the JSON object inside free-form model output.
///
/// A fenced code block holding an object wins; otherwise the first balanced
/// top-level `{...}` span is used.
pub fn locate_json(text: &str) -> Option<&str> {
    fenced_block(text)
        .and_then(first_object)
        .or_else(|| first_object(text))
}

/// Locate and parse the model's JSON object
pub fn parse_payload(text: &str) -> Result<Value> {
    let json = locate_json(text)
        .ok_or_else(|| InvoiceError::MalformedResponse("no JSON object in response".into()))?;

    serde_json::from_str(json).map_err(|e| InvoiceError::MalformedResponse(e.to_string()))
}

/// Body of the first ``` fence, with an optional language tag dropped
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object() {
        assert_eq!(locate_json(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn fenced_json_block() {
        let text = "Here you go:\n```json\n{\"invoiceNumber\": \"A-1\"}\n```\nAnything else?";
        assert_eq!(locate_json(text), Some("{\"invoiceNumber\": \"A-1\"}"));
    }

    #[test]
    fn bare_fence_without_language() {
        let text = "```\n{\"total\": 5}\n```";
        assert_eq!(locate_json(text), Some("{\"total\": 5}"));
    }

    #[test]
    fn first_top_level_span_with_trailing_chatter() {
        let text = r#"Sure! {"items": [{"description": "a } tricky \" one"}]} Also {"b": 2}"#;
        assert_eq!(
            locate_json(text),
            Some(r#"{"items": [{"description": "a } tricky \" one"}]}"#)
        );
    }

    #[test]
    fn fence_without_object_falls_back_to_text() {
        let text = "```\nno json here\n``` but {\"x\": 1}";
        assert_eq!(locate_json(text), Some("{\"x\": 1}"));
    }

    #[test]
    fn unbalanced_or_missing_object() {
        assert_eq!(locate_json("no braces"), None);
        assert_eq!(locate_json("{\"open\": 1"), None);
    }

    #[test]
    fn parse_errors_are_malformed_responses() {
        assert!(matches!(
            parse_payload("I could not read this invoice."),
            Err(InvoiceError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_payload("{not json}"),
            Err(InvoiceError::MalformedResponse(_))
        ));
        assert_eq!(parse_payload("```json\n{\"taxRate\": 8}\n```").unwrap()["taxRate"], 8);
    }
}
