//! HTTP client that simulates how a browser chat page talks to the proxy

use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Client, Method};

use crate::types::{ProxyResponse, SseEvent, StreamingResponse};

/// Path browser clients post to; the proxy ignores it
pub const CHAT_PATH: &str = "/api/chat";

/// Build an HTTP client (no connection pooling for test isolation)
pub fn build_client() -> Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .pool_max_idle_per_host(0)
        .build()
        .expect("Failed to build reqwest client")
}

async fn into_proxy_response(resp: reqwest::Response) -> anyhow::Result<ProxyResponse> {
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let text = resp
        .text()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read proxy response: {}", e))?;
    let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);

    Ok(ProxyResponse {
        status,
        headers,
        text,
        body,
    })
}

/// Send a chat request and return whatever comes back, success or not
pub async fn send_chat(client: &Client, proxy_addr: &str, request_body: serde_json::Value) -> anyhow::Result<ProxyResponse> {
    send_raw(client, proxy_addr, Method::POST, request_body.to_string()).await
}

/// Send an arbitrary method and body to the proxy
pub async fn send_raw(
    client: &Client,
    proxy_addr: &str,
    method: Method,
    body: impl Into<reqwest::Body>,
) -> anyhow::Result<ProxyResponse> {
    let url = format!("http://{proxy_addr}{CHAT_PATH}");

    let resp = client
        .request(method.clone(), &url)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send {} to proxy: {}", method, e))?;

    into_proxy_response(resp).await
}

/// Send a streaming chat completion request to the proxy, collect all SSE events
pub async fn send_streaming(
    client: &Client,
    proxy_addr: &str,
    mut request_body: serde_json::Value,
) -> anyhow::Result<StreamingResponse> {
    request_body["stream"] = serde_json::Value::Bool(true);

    let url = format!("http://{proxy_addr}{CHAT_PATH}");

    let resp = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&request_body)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send streaming request to proxy: {}", e))?;

    let status = resp.status().as_u16();
    if status != 200 {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("Proxy returned error {}: {}", status, body));
    }

    let headers = resp.headers().clone();
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.contains("text/event-stream") {
        return Err(anyhow::anyhow!("Expected text/event-stream but got: {}", content_type));
    }

    // Collect all bytes from the stream
    let mut stream = resp.bytes_stream();
    let mut all_bytes: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk.map_err(|e| anyhow::anyhow!("Stream read error: {}", e))?;
        all_bytes.extend_from_slice(&chunk);
    }

    let raw = String::from_utf8_lossy(&all_bytes).into_owned();
    let events = parse_sse(&raw);

    Ok(StreamingResponse { headers, raw, events })
}

/// Parse SSE body text into events
///
/// Events are separated by a blank line; only `data: ` lines are kept.
fn parse_sse(text: &str) -> Vec<SseEvent> {
    let mut events = Vec::new();

    for raw_event in text.split("\n\n") {
        let raw_event = raw_event.trim();
        if raw_event.is_empty() {
            continue;
        }

        let data = match raw_event.lines().filter_map(|l| l.strip_prefix("data: ")).last() {
            Some(d) => d,
            None => continue,
        };

        events.push(SseEvent {
            data: data.to_string(),
            is_done: data == "[DONE]",
        });
    }

    events
}
