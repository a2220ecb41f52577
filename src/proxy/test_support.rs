//! In-process mock of the inference API for handler tests

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::post,
    Router,
};
use bytes::Bytes;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use super::server::{build_router, ProxyState};
use crate::config::AppConfig;

pub const MOCK_PATH: &str = "/inference/v1/chat/completions";
pub const TEST_API_KEY: &str = "fw-test-key";

/// What the mock serves for the next request
#[derive(Debug, Clone)]
pub enum MockReply {
    Json { status: u16, body: String },
    Chunks(Vec<&'static str>),
    /// Sends the chunks under `status`, then resets the body
    Broken { status: u16, chunks: Vec<&'static str> },
}

impl MockReply {
    pub fn ok(body: serde_json::Value) -> Self {
        MockReply::Json {
            status: 200,
            body: body.to_string(),
        }
    }

    pub fn error(status: u16, body: &str) -> Self {
        MockReply::Json {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub replies: VecDeque<MockReply>,
    pub received: Vec<ReceivedRequest>,
}

#[derive(Clone)]
pub struct MockUpstream {
    pub url: String,
    pub state: Arc<Mutex<MockState>>,
}

impl MockUpstream {
    pub fn queue(&self, reply: MockReply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.state.lock().unwrap().received.clone()
    }
}

pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test001",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "accounts/fireworks/models/deepseek-v3-0324",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

async fn handle_chat(State(state): State<Arc<Mutex<MockState>>>, request: Request) -> Response {
    let headers = request.headers().clone();
    let bytes = to_bytes(request.into_body(), usize::MAX).await.unwrap_or_default();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    let reply = {
        let mut state = state.lock().unwrap();
        state.received.push(ReceivedRequest { headers, body });
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| MockReply::ok(completion_body("Default response (no mock queued)")))
    };

    match reply {
        MockReply::Json { status, body } => Response::builder()
            .status(StatusCode::from_u16(status).unwrap())
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        MockReply::Chunks(chunks) => {
            let stream = futures::stream::iter(
                chunks
                    .into_iter()
                    .map(|c| Ok::<_, std::convert::Infallible>(Bytes::from_static(c.as_bytes()))),
            );
            Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/event-stream")
                .body(Body::from_stream(stream))
                .unwrap()
        }
        MockReply::Broken { status, chunks } => {
            let stream = futures::stream::iter(
                chunks
                    .into_iter()
                    .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                    .chain(std::iter::once(Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "mock body reset",
                    )))),
            );
            Response::builder()
                .status(StatusCode::from_u16(status).unwrap())
                .header("Content-Type", "application/json")
                .body(Body::from_stream(stream))
                .unwrap()
        }
    }
}

/// Start the mock on an ephemeral port
pub async fn start_mock_upstream() -> MockUpstream {
    let state = Arc::new(Mutex::new(MockState::default()));
    let app = Router::new()
        .route(MOCK_PATH, post(handle_chat))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        url: format!("http://{}{}", addr, MOCK_PATH),
        state,
    }
}

/// Config pointing at the mock, with or without an API key
pub fn test_config(mock: &MockUpstream, api_key: Option<&str>) -> AppConfig {
    let mut config = AppConfig::default();
    config.upstream.url = mock.url.clone();
    config.upstream.api_key = api_key.map(str::to_string);
    config
}

pub fn test_router(mock: &MockUpstream, api_key: Option<&str>) -> Router {
    build_router(ProxyState::new(test_config(mock, api_key)).unwrap())
}
