//! Chat completion request and upstream payload types
//!
//! Inbound bodies are loosely typed on purpose: only `model` and `messages`
//! are checked, and only for truthiness. Everything else is forwarded as the
//! caller sent it so the provider can reject it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::GenerationDefaults;

/// JavaScript-style truthiness: null, false, 0, and "" are falsy;
/// arrays and objects are truthy even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn truthy(value: &Option<Value>) -> bool {
    value.as_ref().map(is_truthy).unwrap_or(false)
}

/// Caller value when truthy, the default otherwise.
///
/// A caller-supplied `0` is replaced too, so `temperature: 0` goes upstream
/// as the configured default.
fn or_default(value: &Option<Value>, default: Value) -> Value {
    match value {
        Some(v) if is_truthy(v) => v.clone(),
        _ => default,
    }
}

/// Inbound chat completion request
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<Value>,
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub temperature: Option<Value>,
    #[serde(default)]
    pub top_p: Option<Value>,
    #[serde(default)]
    pub top_k: Option<Value>,
    #[serde(default)]
    pub max_tokens: Option<Value>,
    #[serde(default)]
    pub presence_penalty: Option<Value>,
    #[serde(default)]
    pub frequency_penalty: Option<Value>,
    #[serde(default)]
    pub stream: Option<Value>,
    #[serde(default)]
    pub tools: Option<Value>,
    #[serde(default)]
    pub tool_choice: Option<Value>,
}

impl ChatRequest {
    /// Parse a request body. Anything that is not a JSON object is treated as
    /// an empty request and fails validation later.
    pub fn from_slice(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Names of required fields that are missing or falsy
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !truthy(&self.model) {
            missing.push("model");
        }
        if !truthy(&self.messages) {
            missing.push("messages");
        }
        missing
    }

    /// Whether the caller asked for a streamed response
    pub fn wants_stream(&self) -> bool {
        truthy(&self.stream)
    }

    /// The `tools` array when it has at least one entry
    fn non_empty_tools(&self) -> Option<&Value> {
        self.tools
            .as_ref()
            .filter(|t| t.as_array().map(|a| !a.is_empty()).unwrap_or(false))
    }

    /// Build the provider payload, substituting defaults for falsy parameters
    pub fn to_upstream(&self, defaults: &GenerationDefaults) -> UpstreamPayload {
        let tools = self.non_empty_tools().cloned();
        let tool_choice = if tools.is_some() {
            self.tool_choice.clone().filter(is_truthy)
        } else {
            None
        };

        UpstreamPayload {
            model: self.model.clone().unwrap_or(Value::Null),
            messages: self.messages.clone().unwrap_or(Value::Null),
            temperature: or_default(&self.temperature, json!(defaults.temperature)),
            top_p: or_default(&self.top_p, json!(defaults.top_p)),
            top_k: or_default(&self.top_k, json!(defaults.top_k)),
            max_tokens: or_default(&self.max_tokens, json!(defaults.max_tokens)),
            presence_penalty: or_default(&self.presence_penalty, json!(defaults.presence_penalty)),
            frequency_penalty: or_default(&self.frequency_penalty, json!(defaults.frequency_penalty)),
            stream: or_default(&self.stream, Value::Bool(false)),
            tools,
            tool_choice,
        }
    }
}

/// Body sent to the inference provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamPayload {
    pub model: Value,
    pub messages: Value,
    pub temperature: Value,
    pub top_p: Value,
    pub top_k: Value,
    pub max_tokens: Value,
    pub presence_penalty: Value,
    pub frequency_penalty: Value,
    pub stream: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}
