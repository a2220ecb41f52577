//! Mock upstream server that simulates the Fireworks chat completions API
//!
//! Tests pre-configure responses via SharedUpstreamState before each request.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    response::Response,
    routing::post,
    Router,
};
use bytes::Bytes;
use futures::StreamExt;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::types::{MockResponse, ReceivedRequest, SharedUpstreamState, UpstreamState};

/// Path the proxy is configured to forward to
pub const CHAT_PATH: &str = "/inference/v1/chat/completions";

/// Default fallback response when no response is queued
fn default_completion_response() -> MockResponse {
    MockResponse::json(
        r#"{"id":"chatcmpl-default","object":"chat.completion","created":1700000000,"model":"accounts/fireworks/models/deepseek-v3-0324","choices":[{"index":0,"message":{"role":"assistant","content":"Default response (no mock queued)"},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#,
    )
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Handle POST /inference/v1/chat/completions - serves pre-configured mock responses
async fn handle_chat_completions(State(state): State<SharedUpstreamState>, request: Request<Body>) -> Response {
    let headers = request.headers().clone();
    let body_bytes = axum::body::to_bytes(request.into_body(), 10 * 1024 * 1024)
        .await
        .unwrap_or_default();
    let body_json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    let received = ReceivedRequest {
        authorization: header_string(&headers, header::AUTHORIZATION),
        user_agent: header_string(&headers, header::USER_AGENT),
        accept: header_string(&headers, header::ACCEPT),
        body: body_json,
    };

    // Pop the next configured response (or use default)
    let mock_response = {
        let mut state = state.lock().unwrap();
        state.received_requests.push(received);
        state.response_queue.pop_front().unwrap_or_else(default_completion_response)
    };

    match mock_response {
        MockResponse::Body {
            status,
            body,
            content_type,
        } => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap(),
        MockResponse::Stream {
            chunks,
            delay_ms,
            fail_after,
        } => {
            let mut items: Vec<Result<Bytes, std::io::Error>> =
                chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
            if fail_after {
                items.push(Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "mock upstream dropped the stream",
                )));
            }

            let stream = futures::stream::iter(items).then(move |item| async move {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                item
            });

            Response::builder()
                .status(200)
                .header(header::CONTENT_TYPE, "text/event-stream")
                .header(header::CACHE_CONTROL, "no-cache")
                .body(Body::from_stream(stream))
                .unwrap()
        }
    }
}

/// Start the mock upstream server and return the shared state handle
pub async fn start(port: u16) -> anyhow::Result<SharedUpstreamState> {
    let state: SharedUpstreamState = std::sync::Arc::new(std::sync::Mutex::new(UpstreamState::default()));

    let app = Router::new()
        .route(CHAT_PATH, post(handle_chat_completions))
        .with_state(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind mock upstream to {}: {}", addr, e))?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock upstream server failed");
    });

    // Brief pause to let the server start accepting connections
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    Ok(state)
}

/// Helper to configure the next response for the chat endpoint
pub fn queue_response(state: &SharedUpstreamState, response: MockResponse) {
    state.lock().unwrap().response_queue.push_back(response);
}

/// Helper to get all requests received since last clear
pub fn drain_requests(state: &SharedUpstreamState) -> Vec<ReceivedRequest> {
    let mut s = state.lock().unwrap();
    s.received_requests.drain(..).collect()
}
