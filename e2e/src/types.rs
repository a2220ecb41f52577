//! Shared types for the e2e test framework

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What the mock upstream serves for the next chat completion request
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A complete body with a status code
    Body {
        status: u16,
        body: String,
        content_type: String,
    },
    /// SSE chunks sent one at a time, optionally failing the connection afterwards
    Stream {
        chunks: Vec<String>,
        delay_ms: u64,
        fail_after: bool,
    },
}

impl MockResponse {
    /// Create a standard JSON chat completion response
    pub fn json(body: impl Into<String>) -> Self {
        MockResponse::Body {
            status: 200,
            body: body.into(),
            content_type: "application/json".to_string(),
        }
    }

    /// Create an error response
    pub fn error(status: u16, body: impl Into<String>) -> Self {
        MockResponse::Body {
            status,
            body: body.into(),
            content_type: "application/json".to_string(),
        }
    }

    /// Stream the given SSE chunks with a short pause between them
    pub fn stream(chunks: Vec<String>) -> Self {
        MockResponse::Stream {
            chunks,
            delay_ms: 20,
            fail_after: false,
        }
    }

    /// Stream the chunks, then break the connection mid-body
    pub fn stream_then_fail(chunks: Vec<String>) -> Self {
        MockResponse::Stream {
            chunks,
            delay_ms: 20,
            fail_after: true,
        }
    }
}

/// Shared state for the mock upstream server
#[derive(Debug, Default)]
pub struct UpstreamState {
    /// Queue of responses to serve - tests push responses, upstream pops and serves them
    pub response_queue: VecDeque<MockResponse>,
    /// All requests received by the upstream (for inspection)
    pub received_requests: Vec<ReceivedRequest>,
}

/// A request received by the mock upstream
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub accept: Option<String>,
    pub body: serde_json::Value,
}

pub type SharedUpstreamState = Arc<Mutex<UpstreamState>>;

/// A parsed SSE event from the proxy streaming response
#[derive(Debug, Clone)]
pub struct SseEvent {
    pub data: String,
    pub is_done: bool,
}

impl SseEvent {
    pub fn parse_json(&self) -> anyhow::Result<serde_json::Value> {
        serde_json::from_str(&self.data).map_err(|e| anyhow::anyhow!("SSE JSON parse error: {}: {}", e, self.data))
    }
}

/// Result of a non-streaming proxy request
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    /// Raw body text
    pub text: String,
    /// Parsed body, `Null` when empty or not JSON
    pub body: serde_json::Value,
}

impl ProxyResponse {
    /// Get a nested field using dot notation (e.g. "choices.0.message.content")
    pub fn get(&self, path: &str) -> Option<&serde_json::Value> {
        let mut current = &self.body;
        for part in path.split('.') {
            current = if let Ok(idx) = part.parse::<usize>() {
                current.as_array()?.get(idx)?
            } else {
                current.as_object()?.get(part)?
            };
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Result of a streaming proxy request - raw body and parsed SSE events
#[derive(Debug)]
pub struct StreamingResponse {
    pub headers: reqwest::header::HeaderMap,
    pub raw: String,
    pub events: Vec<SseEvent>,
}

impl StreamingResponse {
    /// Check that the stream ends with [DONE]
    pub fn has_done_marker(&self) -> bool {
        self.events.last().map(|e| e.is_done).unwrap_or(false)
    }

    /// Get all data events (excluding [DONE])
    pub fn data_events(&self) -> Vec<&SseEvent> {
        self.events.iter().filter(|e| !e.is_done).collect()
    }

    /// Accumulate all text content deltas
    pub fn accumulated_content(&self) -> String {
        let mut result = String::new();
        for event in self.data_events() {
            if let Ok(json) = event.parse_json() {
                if let Some(content) = json
                    .pointer("/choices/0/delta/content")
                    .and_then(|v| v.as_str())
                {
                    result.push_str(content);
                }
            }
        }
        result
    }

    /// The `error` field of the last data event, if it has one
    pub fn trailing_error(&self) -> Option<String> {
        let last = self.data_events().last()?.parse_json().ok()?;
        last.get("error")?.as_str().map(str::to_string)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Result of a single test case
#[derive(Debug)]
#[allow(dead_code)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
