//! Main proxy server implementation

use axum::{extract::State, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handler::ProxyHandler;
use super::upstream::build_http_client;
use crate::config::{AppConfig, ConfigError};

/// Shared state for the proxy
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<AppConfig>,
    pub http_client: reqwest::Client,
}

impl ProxyState {
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        let http_client = build_http_client(&config.upstream)?;
        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }
}

/// Every path and method goes through the proxy handler
pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Run the proxy server
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    if config.upstream.api_key().is_none() {
        tracing::warn!(
            "{} is not set; every chat request will fail with a configuration error",
            crate::config::API_KEY_ENV
        );
    }

    let upstream_url = config.upstream.url.clone();
    let app = build_router(ProxyState::new(config)?);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("fireworks-proxy listening on {}", addr);
    tracing::info!("Forwarding to {}", upstream_url);

    Ok(axum::serve(listener, app).await?)
}

async fn proxy_handler(State(state): State<ProxyState>, req: axum::extract::Request) -> axum::response::Response {
    let handler = ProxyHandler::new(state);
    handler.handle(req).await
}
