//! Proxy failures and their JSON responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::cors;

/// Every way a request can fail before a response is committed
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Server configuration error: {0}")]
    Configuration(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Non-success status from the provider, relayed with the same code
    #[error("Upstream error {status}: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl ProxyError {
    pub fn missing_api_key() -> Self {
        ProxyError::Configuration(format!(
            "The inference API key is not configured on the server ({} is not set)",
            crate::config::API_KEY_ENV
        ))
    }

    pub fn missing_fields(fields: &[&str]) -> Self {
        ProxyError::BadRequest(format!("Missing required fields: {}", fields.join(", ")))
    }

    /// Map a failed provider response to a caller-facing error.
    ///
    /// Well-known statuses get a fixed message; anything else relays the
    /// provider's error text verbatim. The status code is kept either way.
    pub fn from_upstream(status: StatusCode, body: &str) -> Self {
        let message = match status.as_u16() {
            429 => "Rate limit exceeded. Please wait a moment and try again.".to_string(),
            401 => "Authentication with the inference API failed. Check the server API key.".to_string(),
            400 => "The inference API rejected the request. Check the request parameters.".to_string(),
            503 => "The inference API is temporarily unavailable. Please try again later.".to_string(),
            _ => body.to_string(),
        };
        ProxyError::Upstream { status, message }
    }

    /// Classify a transport failure talking to the provider
    pub fn from_transport(err: &reqwest::Error) -> Self {
        ProxyError::Internal(describe_failure(
            &err.to_string(),
            err.is_timeout(),
            err.is_connect(),
        ))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short category string for the `error` field
    pub fn category(&self) -> &'static str {
        match self {
            ProxyError::MethodNotAllowed => "Method not allowed",
            ProxyError::Configuration(_) => "Server configuration error",
            ProxyError::BadRequest(_) => "Bad request",
            ProxyError::Upstream { .. } => "Fireworks API error",
            ProxyError::Internal(_) => "Internal server error",
        }
    }

    fn message(&self) -> Option<String> {
        match self {
            ProxyError::MethodNotAllowed => None,
            ProxyError::Configuration(msg)
            | ProxyError::BadRequest(msg)
            | ProxyError::Internal(msg)
            | ProxyError::Upstream { message: msg, .. } => Some(msg.clone()),
        }
    }
}

/// Best-effort human message for a failure nobody handled more specifically
pub fn describe_failure(raw: &str, is_timeout: bool, is_connect: bool) -> String {
    let lower = raw.to_lowercase();
    if is_timeout || lower.contains("timeout") || lower.contains("timed out") {
        "The request to the inference API took too long and timed out. Try again or reduce max_tokens."
            .to_string()
    } else if is_connect || lower.contains("network") || lower.contains("connection") || lower.contains("dns") {
        "Network error: could not reach the inference API. Check the server's connectivity.".to_string()
    } else {
        raw.to_string()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.category(),
            message: self.message(),
        };

        let mut response = (status, Json(body)).into_response();
        cors::apply(response.headers_mut(), cors::ALLOW_HEADERS);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::header;

    async fn body_json(err: ProxyError) -> (StatusCode, serde_json::Value, Response) {
        let response = err.into_response();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, json, Response::from_parts(parts, axum::body::Body::empty()))
    }

    #[tokio::test]
    async fn test_method_not_allowed_body() {
        let (status, json, _) = body_json(ProxyError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json, serde_json::json!({"error": "Method not allowed"}));
    }

    #[tokio::test]
    async fn test_error_response_has_cors_and_json() {
        let (status, json, response) = body_json(ProxyError::missing_fields(&["model"])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Bad request");
        assert_eq!(json["message"], "Missing required fields: model");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization"
        );
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
    }

    #[tokio::test]
    async fn test_configuration_message_names_variable() {
        let (status, json, _) = body_json(ProxyError::missing_api_key()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Server configuration error");
        assert!(json["message"].as_str().unwrap().contains("FIREWORKS_API_KEY"));
    }

    #[test]
    fn test_known_upstream_statuses_are_translated() {
        for (code, needle) in [
            (429, "Rate limit"),
            (401, "Authentication"),
            (400, "rejected the request"),
            (503, "temporarily unavailable"),
        ] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = ProxyError::from_upstream(status, "raw upstream text");
            assert_eq!(err.status(), status);
            let message = err.message().unwrap();
            assert!(message.contains(needle), "{code}: {message}");
            assert!(!message.contains("raw upstream text"));
        }
    }

    #[test]
    fn test_other_upstream_statuses_relay_raw_text() {
        for code in [402, 404, 418, 500, 502] {
            let status = StatusCode::from_u16(code).unwrap();
            let raw = format!(r#"{{"error":"status {code}"}}"#);
            let err = ProxyError::from_upstream(status, &raw);
            assert_eq!(err.status(), status);
            assert_eq!(err.message().unwrap(), raw);
        }
    }

    #[test]
    fn test_describe_failure() {
        assert!(describe_failure("operation timed out", false, false).contains("took too long"));
        assert!(describe_failure("anything", true, false).contains("took too long"));
        assert!(describe_failure("error sending request", false, true).contains("Network error"));
        assert!(describe_failure("connection reset by peer", false, false).contains("Network error"));
        assert_eq!(describe_failure("expected value at line 1", false, false), "expected value at line 1");
    }
}
