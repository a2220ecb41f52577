//! Common test helpers and JSON builders

use serde_json::{json, Value};

use crate::types::ProxyResponse;

pub const MODEL: &str = "accounts/fireworks/models/deepseek-v3-0324";

/// Key the harness hands the spawned proxy through FIREWORKS_API_KEY
pub const E2E_API_KEY: &str = "fw-e2e-test-key";

// ─── Request builders ────────────────────────────────────────────────────────

/// Build a minimal chat request with no generation parameters
pub fn basic_request(prompt: &str) -> Value {
    json!({
        "model": MODEL,
        "messages": [{"role": "user", "content": prompt}]
    })
}

/// Build a request carrying one weather tool
pub fn request_with_tool(prompt: &str) -> Value {
    let mut req = basic_request(prompt);
    req["tools"] = json!([{
        "type": "function",
        "function": {
            "name": "get_weather",
            "description": "Get the current weather for a city",
            "parameters": {
                "type": "object",
                "properties": {"city": {"type": "string"}},
                "required": ["city"]
            }
        }
    }]);
    req
}

// ─── Upstream response builders ──────────────────────────────────────────────

/// Build a normal text completion response from the "upstream"
pub fn upstream_text_response(content: &str) -> String {
    json!({
        "id": "chatcmpl-test001",
        "object": "chat.completion",
        "created": 1700000000,
        "model": MODEL,
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "total_tokens": 15
        }
    })
    .to_string()
}

/// Build a tool call completion response
pub fn upstream_tool_call_response(tool_name: &str, args_json: &str) -> String {
    json!({
        "id": "chatcmpl-test002",
        "object": "chat.completion",
        "created": 1700000000,
        "model": MODEL,
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call-001",
                    "type": "function",
                    "function": {
                        "name": tool_name,
                        "arguments": args_json
                    }
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {
            "prompt_tokens": 20,
            "completion_tokens": 30,
            "total_tokens": 50
        }
    })
    .to_string()
}

/// One SSE chunk carrying a content delta
pub fn sse_content_chunk(content: &str) -> String {
    let chunk = json!({
        "id": "chatcmpl-stream001",
        "object": "chat.completion.chunk",
        "created": 1700000000,
        "model": MODEL,
        "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
    });
    format!("data: {}\n\n", chunk)
}

pub fn sse_done() -> String {
    "data: [DONE]\n\n".to_string()
}

// ─── Assertion helpers ────────────────────────────────────────────────────────

/// Assert two strings are equal, with context on failure
pub fn assert_eq_str(actual: &str, expected: &str, label: &str) -> anyhow::Result<()> {
    if actual != expected {
        Err(anyhow::anyhow!("{label}: expected {:?} but got {:?}", expected, actual))
    } else {
        Ok(())
    }
}

/// Assert condition is true, with message
pub fn assert_true(cond: bool, msg: &str) -> anyhow::Result<()> {
    if !cond {
        Err(anyhow::anyhow!("{}", msg))
    } else {
        Ok(())
    }
}

pub fn assert_status(resp: &ProxyResponse, expected: u16) -> anyhow::Result<()> {
    assert_true(
        resp.status == expected,
        &format!("Expected status {}, got {}: {}", expected, resp.status, resp.text),
    )
}

/// Assert the `{error, message}` failure body
pub fn assert_error_body(resp: &ProxyResponse, error: &str, message_contains: &str) -> anyhow::Result<()> {
    let actual_error = resp.get_str("error").unwrap_or_default();
    assert_eq_str(actual_error, error, "error field")?;
    let message = resp.get_str("message").unwrap_or_default();
    assert_true(
        message.contains(message_contains),
        &format!("message should contain {:?}, got {:?}", message_contains, message),
    )
}

/// Assert the wildcard CORS headers with the given Allow-Headers value
pub fn assert_cors(headers: &reqwest::header::HeaderMap, allow_headers: &str) -> anyhow::Result<()> {
    let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default();
    assert_eq_str(get("access-control-allow-origin"), "*", "Access-Control-Allow-Origin")?;
    assert_eq_str(
        get("access-control-allow-methods"),
        "GET, POST, OPTIONS",
        "Access-Control-Allow-Methods",
    )?;
    assert_eq_str(get("access-control-allow-headers"), allow_headers, "Access-Control-Allow-Headers")
}
