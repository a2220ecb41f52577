//! Token usage records from completed responses

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::api::ChatRequest;

/// Usage for one non-streaming completion
#[derive(Debug, Clone, Serialize)]
pub struct UsageRecord {
    /// Unique request ID
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    /// Model reported by the provider, else the requested one
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Input message count
    pub input_messages: usize,
    pub finish_reason: String,
    /// Round trip through the provider in ms
    pub duration_ms: f64,
    /// Completion tokens per second of round trip
    pub generation_tps: f64,
}

impl UsageRecord {
    /// Build a record when the response carries a `usage` object
    pub fn from_response(response: &Value, request: &ChatRequest, duration_ms: f64) -> Option<Self> {
        let usage = response.get("usage")?;

        let tokens = |key: &str| usage.get(key).and_then(|t| t.as_u64()).unwrap_or(0);
        let prompt_tokens = tokens("prompt_tokens");
        let completion_tokens = tokens("completion_tokens");
        let total_tokens = match tokens("total_tokens") {
            0 => prompt_tokens + completion_tokens,
            n => n,
        };

        let model = response
            .get("model")
            .and_then(|m| m.as_str())
            .or_else(|| request.model.as_ref().and_then(|m| m.as_str()))
            .unwrap_or("unknown")
            .to_string();

        let finish_reason = response
            .pointer("/choices/0/finish_reason")
            .and_then(|f| f.as_str())
            .unwrap_or("unknown")
            .to_string();

        let input_messages = request
            .messages
            .as_ref()
            .and_then(|m| m.as_array())
            .map(|a| a.len())
            .unwrap_or(0);

        let generation_tps = if duration_ms > 0.0 {
            completion_tokens as f64 / (duration_ms / 1000.0)
        } else {
            0.0
        };

        Some(Self {
            request_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            model,
            prompt_tokens,
            completion_tokens,
            total_tokens,
            input_messages,
            finish_reason,
            duration_ms,
            generation_tps,
        })
    }
}
