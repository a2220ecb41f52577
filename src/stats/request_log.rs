//! Request logging formatter

use serde_json::Value;

use crate::api::ChatRequest;

/// One-line summary of an inbound chat request
pub fn format_request_log(request: &ChatRequest) -> String {
    let model = request
        .model
        .as_ref()
        .and_then(|m| m.as_str())
        .unwrap_or("unknown");

    let messages = request.messages.as_ref().and_then(|m| m.as_array());
    let msg_count = messages.map(|a| a.len()).unwrap_or(0);

    let mut parts = vec![format!("model={}", model), format!("msgs={}", msg_count)];

    if request.wants_stream() {
        parts.push("stream".to_string());
    }

    let tools_count = request
        .tools
        .as_ref()
        .and_then(|t| t.as_array())
        .map(|a| a.len())
        .unwrap_or(0);
    if tools_count > 0 {
        parts.push(format!("tools={}", tools_count));
    }

    if let Some(msg) = messages.and_then(|m| first_user_message(m)) {
        parts.push(format!("\"{}\"", msg));
    }

    format!("→ {}", parts.join(" "))
}

/// First user message, whitespace-collapsed and shortened
fn first_user_message(messages: &[Value]) -> Option<String> {
    let msg = messages
        .iter()
        .find(|m| m.get("role").and_then(|r| r.as_str()) == Some("user"))?;

    let content = message_text(msg)?;
    Some(shorten(&collapse_whitespace(&content)))
}

/// Text of a message whose content is a string or an array of text parts
fn message_text(msg: &Value) -> Option<String> {
    match msg.get("content")? {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts
                .iter()
                .filter(|p| p.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join(" "))
            }
        }
        _ => None,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep short messages whole; long ones become head + " ... " + tail
fn shorten(s: &str) -> String {
    const MAX_CHARS: usize = 100;
    const HEAD: usize = 25;
    const TAIL: usize = 75;

    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= MAX_CHARS {
        return s.to_string();
    }

    let head: String = chars[..HEAD].iter().collect();
    let tail: String = chars[chars.len() - TAIL..].iter().collect();
    format!("{} ... {}", head, tail)
}
