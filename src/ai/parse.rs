//! Lenient extraction of structured data from model replies
//!
//! Models asked for JSON routinely wrap it in code fences or prose. These
//! helpers are pure functions so the tolerant-parsing rules are unit
//! testable without a live model.

use serde_json::Value;

/// Strip a surrounding Markdown code fence, if present
///
/// Handles both bare fences and language-tagged ones (```json).
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    // Drop the opening fence line
    let after_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return trimmed,
    };

    // Drop the closing fence
    match after_open.rfind("```") {
        Some(idx) => after_open[..idx].trim(),
        None => after_open.trim(),
    }
}

/// Extract the first JSON object or array from a reply
///
/// Tries the whole (fence-stripped) reply first, then scans for the first
/// balanced `{...}` or `[...]`. Returns `None` when no parseable JSON
/// container is found.
pub fn extract_json(reply: &str) -> Option<Value> {
    let cleaned = strip_code_fences(reply);

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        if value.is_object() || value.is_array() {
            return Some(value);
        }
    }

    let start = cleaned.find(|c| c == '{' || c == '[')?;
    let candidate = balanced_slice(&cleaned[start..])?;
    serde_json::from_str(candidate).ok()
}

/// The shortest prefix of `s` that balances its opening brace/bracket,
/// skipping string literals
fn balanced_slice(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let open = *bytes.first()?;
    let close = match open {
        b'{' => b'}',
        b'[' => b']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
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

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(&s[..=i]);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_bare_fence() {
        let reply = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(reply), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_language_tagged_fence() {
        let reply = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(reply), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  hello world  "), "hello world");
    }

    #[test]
    fn test_extract_clean_json() {
        let value = extract_json(r#"{"corrected": "Hello.", "issues": []}"#).unwrap();
        assert_eq!(value["corrected"], "Hello.");
    }

    #[test]
    fn test_extract_fenced_json() {
        let reply = "```json\n{\"word\": \"ardent\"}\n```";
        assert_eq!(extract_json(reply).unwrap(), json!({"word": "ardent"}));
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let reply = "Sure! Here is the analysis you asked for:\n{\"total\": 3, \"nested\": {\"ok\": true}}\nHope this helps.";
        let value = extract_json(reply).unwrap();
        assert_eq!(value["total"], 3);
        assert_eq!(value["nested"]["ok"], true);
    }

    #[test]
    fn test_extract_handles_braces_inside_strings() {
        let reply = r#"Result: {"text": "use {braces} and \"quotes\" freely", "ok": true} done"#;
        let value = extract_json(reply).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_extract_array_after_multibyte_text() {
        let reply = "Voilà, the verdicts: [{\"text\": \"One.\", \"correct\": true}] - end";
        let value = extract_json(reply).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["correct"], true);
    }

    #[test]
    fn test_extract_nothing_from_plain_prose() {
        assert_eq!(extract_json("I could not produce JSON, sorry."), None);
        assert_eq!(extract_json(""), None);
    }

    #[test]
    fn test_unbalanced_json_is_rejected() {
        assert_eq!(extract_json(r#"{"a": {"b": 1}"#), None);
    }
}
