//! fireworks-proxy: chat completion proxy for the Fireworks inference API
//!
//! Features:
//! - Request validation and default generation parameters
//! - Server-side API key injection
//! - Buffered JSON or relayed SSE responses
//! - Friendly error translation for provider failures
//! - Per-request usage logging

pub mod api;
pub mod config;
pub mod proxy;
pub mod stats;

pub use config::AppConfig;
pub use proxy::run_server;
