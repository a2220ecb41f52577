//! Request/response handler for the proxy

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::time::Instant;

use super::cors;
use super::error::ProxyError;
use super::server::ProxyState;
use super::streaming::sse_response;
use super::upstream::send_chat;
use crate::api::ChatRequest;
use crate::stats::{format_request_log, format_usage, UsageRecord};

/// Largest request body accepted from a caller
const MAX_BODY_BYTES: usize = 1024 * 1024 * 100;

/// Proxy request handler
pub struct ProxyHandler {
    state: ProxyState,
}

impl ProxyHandler {
    pub fn new(state: ProxyState) -> Self {
        Self { state }
    }

    /// Handle an incoming request
    pub async fn handle(&self, req: Request<Body>) -> Response {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        tracing::debug!(method = %method, path = %path, "Processing request");

        match self.process(req, start).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    ProxyError::Configuration(_) | ProxyError::Internal(_) => {
                        tracing::error!(error = %err, method = %method, path = %path, "Request failed")
                    }
                    ProxyError::Upstream { .. } => {
                        tracing::warn!(error = %err, method = %method, path = %path, "Request failed")
                    }
                    _ => tracing::debug!(error = %err, method = %method, path = %path, "Request rejected"),
                }
                err.into_response()
            }
        }
    }

    async fn process(&self, req: Request<Body>, start: Instant) -> Result<Response, ProxyError> {
        match *req.method() {
            Method::OPTIONS => return Ok(preflight_response()),
            Method::POST => {}
            _ => return Err(ProxyError::MethodNotAllowed),
        }

        let config = &self.state.config;
        let api_key = config.upstream.api_key().ok_or_else(ProxyError::missing_api_key)?;

        let body_bytes = to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| ProxyError::BadRequest(format!("Failed to read request body: {}", e)))?;

        let request = ChatRequest::from_slice(&body_bytes);
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(ProxyError::missing_fields(&missing));
        }

        tracing::info!("{}", format_request_log(&request));

        let streaming = request.wants_stream();
        let payload = request.to_upstream(&config.defaults);

        let upstream = send_chat(&self.state.http_client, &config.upstream, api_key, &payload, streaming)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reach inference API");
                ProxyError::from_transport(&e)
            })?;

        let status = upstream.status();
        tracing::debug!(status = %status, headers = ?upstream.headers(), "Received response from inference API");

        if !status.is_success() {
            let text = upstream.text().await.map_err(|e| ProxyError::from_transport(&e))?;
            tracing::error!(status = %status, body = %text, "Inference API returned an error");
            return Err(ProxyError::from_upstream(status, &text));
        }

        if streaming {
            if upstream.content_length() == Some(0) {
                return Err(ProxyError::Upstream {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "No response body received from the inference API".to_string(),
                });
            }
            return Ok(sse_response(upstream.bytes_stream()));
        }

        let bytes = upstream.bytes().await.map_err(|e| ProxyError::from_transport(&e))?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| ProxyError::Internal(format!("Failed to decode inference API response: {}", e)))?;

        if config.stats.enabled {
            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
            if let Some(record) = UsageRecord::from_response(&value, &request, duration_ms) {
                tracing::info!("{}", format_usage(&record, config.stats.format));
            }
        }

        let mut response = (StatusCode::OK, Json(value)).into_response();
        cors::apply(response.headers_mut(), cors::ALLOW_HEADERS);
        Ok(response)
    }
}

/// Empty 200 answering a CORS preflight
fn preflight_response() -> Response {
    let mut response = StatusCode::OK.into_response();
    cors::apply(response.headers_mut(), cors::ALLOW_HEADERS);
    response
}
