//! Local token estimation.
//!
//! A deterministic chars/4 heuristic over the request body so clients can
//! count tokens without waking a backend. Pure function of the body.

use serde_json::Value;

/// Estimate the input token count for a chat-style request body.
///
/// Sums the character length of every message `content` (strings
/// directly; for list-valued content, the `text` of parts whose `type` is
/// `"text"`), plus a top-level `system` string if present. The estimate
/// is `max(1, chars / 4)` with integer division, so an empty body still
/// yields 1.
pub fn estimate_tokens(body: &Value) -> u64 {
    let mut chars: u64 = 0;

    if let Some(messages) = body.get("messages").and_then(Value::as_array) {
        for message in messages {
            match message.get("content") {
                Some(Value::String(text)) => chars += text.chars().count() as u64,
                Some(Value::Array(parts)) => {
                    for part in parts {
                        if part.get("type").and_then(Value::as_str) == Some("text") {
                            if let Some(text) = part.get("text").and_then(Value::as_str) {
                                chars += text.chars().count() as u64;
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(system) = body.get("system").and_then(Value::as_str) {
        chars += system.chars().count() as u64;
    }

    (chars / 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_body_yields_one() {
        assert_eq!(estimate_tokens(&Value::Null), 1);
        assert_eq!(estimate_tokens(&json!({})), 1);
        assert_eq!(estimate_tokens(&json!({"messages": []})), 1);
        assert_eq!(
            estimate_tokens(&json!({"messages": [{"role": "user", "content": ""}]})),
            1
        );
    }

    #[test]
    fn test_string_content() {
        // 11 chars -> 11 / 4 = 2
        let body = json!({"messages": [{"role": "user", "content": "hello world"}]});
        assert_eq!(estimate_tokens(&body), 2);
    }

    #[test]
    fn test_system_only() {
        // 4 chars -> exactly 1
        let body = json!({"system": "abcd", "messages": []});
        assert_eq!(estimate_tokens(&body), 1);
    }

    #[test]
    fn test_system_adds_to_messages() {
        // 8 + 8 chars -> 4
        let body = json!({
            "system": "abcdefgh",
            "messages": [{"role": "user", "content": "abcdefgh"}]
        });
        assert_eq!(estimate_tokens(&body), 4);
    }

    #[test]
    fn test_list_content_counts_only_text_parts() {
        let body = json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "abcdefgh"},
                    {"type": "image", "source": {"data": "AAAAAAAAAAAAAAAA"}},
                    {"type": "text", "text": "abcdefgh"}
                ]
            }]
        });
        assert_eq!(estimate_tokens(&body), 4);
    }

    #[test]
    fn test_non_string_system_ignored() {
        let body = json!({"system": 42, "messages": []});
        assert_eq!(estimate_tokens(&body), 1);
    }

    #[test]
    fn test_integer_division_truncates() {
        // 7 chars -> 7 / 4 = 1
        let body = json!({"messages": [{"role": "user", "content": "abcdefg"}]});
        assert_eq!(estimate_tokens(&body), 1);
    }
}
