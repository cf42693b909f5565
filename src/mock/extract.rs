//! Instruction text extraction from completion-style payloads.
//!
//! Two request shapes are understood:
//!
//! ```text
//! chat completions:  {"messages": [..., {"role": "user", "content": "..."}]}
//! responses API:     {"input": "..."}
//!                    {"input": [..., {"content": "..."}]}
//!                    {"input": [..., {"content": [..., {"type": "input_text", "text": "..."}]}]}
//! ```
//!
//! `input` wins when it is a non-empty string or list; otherwise the last
//! entry of `messages` is used. Content given as a list of parts resolves to
//! the `text` of the last part. Anything missing yields an empty string.

use serde_json::Value;

/// Final user-authored text of either payload shape, or `""`.
pub fn last_message_text(payload: &Value) -> String {
    match payload.get("input") {
        Some(Value::String(text)) if !text.is_empty() => return text.clone(),
        Some(Value::Array(items)) if !items.is_empty() => {
            return items.last().map(message_content).unwrap_or_default();
        }
        _ => {}
    }

    payload
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| messages.last())
        .map(message_content)
        .unwrap_or_default()
}

fn message_content(message: &Value) -> String {
    match message.get("content") {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .last()
            .and_then(|part| part.get("text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_completions_last_message() {
        let payload = json!({
            "model": "gpt-test",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello d2 l3"}
            ]
        });
        assert_eq!(last_message_text(&payload), "hello d2 l3");
    }

    #[test]
    fn chat_completions_content_parts() {
        let payload = json!({
            "messages": [{"role": "user", "content": [
                {"type": "text", "text": "first"},
                {"type": "text", "text": "second"}
            ]}]
        });
        assert_eq!(last_message_text(&payload), "second");
    }

    #[test]
    fn responses_string_input() {
        assert_eq!(last_message_text(&json!({"input": "plain l1"})), "plain l1");
    }

    #[test]
    fn responses_item_list() {
        let payload = json!({
            "input": [
                {"role": "user", "content": "old"},
                {"role": "user", "content": [
                    {"type": "input_image", "image_url": "data:..."},
                    {"type": "input_text", "text": "describe d1"}
                ]}
            ]
        });
        assert_eq!(last_message_text(&payload), "describe d1");
    }

    #[test]
    fn empty_input_falls_back_to_messages() {
        let payload = json!({
            "input": [],
            "messages": [{"role": "user", "content": "from messages"}]
        });
        assert_eq!(last_message_text(&payload), "from messages");
    }

    #[test]
    fn missing_everything_is_empty() {
        assert_eq!(last_message_text(&json!({})), "");
        assert_eq!(last_message_text(&json!({"messages": []})), "");
        assert_eq!(last_message_text(&json!({"input": [{"content": 5}]})), "");
        assert_eq!(last_message_text(&json!({"input": [{"content": []}]})), "");
        assert_eq!(last_message_text(&json!([1, 2, 3])), "");
    }
}
