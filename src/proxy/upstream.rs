//! Outbound calls to the inference provider

use axum::http::header;
use std::time::Duration;

use crate::api::UpstreamPayload;
use crate::config::{ConfigError, UpstreamConfig};

/// Build the HTTP client used for provider calls
pub fn build_http_client(config: &UpstreamConfig) -> Result<reqwest::Client, ConfigError> {
    let mut client_builder = reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .pool_max_idle_per_host(10);

    if let Some(secs) = config.timeout_seconds {
        client_builder = client_builder.timeout(Duration::from_secs(secs));
    }

    if let Some(ref tls) = config.tls {
        if tls.accept_invalid_certs {
            client_builder = client_builder.danger_accept_invalid_certs(true);
            tracing::warn!("TLS: Accepting invalid certificates (use only for development/testing)");
        }

        if let Some(ref ca_path) = tls.ca_cert_path {
            let ca_cert = std::fs::read(ca_path)?;
            let ca_cert = reqwest::Certificate::from_pem(&ca_cert)
                .map_err(|e| ConfigError::Validation(format!("invalid CA certificate {}: {}", ca_path, e)))?;
            client_builder = client_builder.add_root_certificate(ca_cert);
            tracing::info!("TLS: Loaded custom CA certificate from {}", ca_path);
        }
    }

    client_builder
        .build()
        .map_err(|e| ConfigError::Validation(format!("failed to build HTTP client: {}", e)))
}

/// Send one chat completion request to the provider.
///
/// Only transport failures are errors here; a non-success status is
/// returned as a response for the caller to translate.
pub async fn send_chat(
    client: &reqwest::Client,
    config: &UpstreamConfig,
    api_key: &str,
    payload: &UpstreamPayload,
    streaming: bool,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut request = client
        .post(&config.url)
        .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
        .header(header::CONTENT_TYPE, "application/json")
        .json(payload);

    if streaming {
        request = request.header(header::ACCEPT, "text/event-stream");
    }

    tracing::debug!(url = %config.url, streaming, "Dispatching upstream request");
    request.send().await
}
