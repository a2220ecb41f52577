//! HTTP proxy server

mod cors;
mod error;
mod handler;
pub mod server;
mod streaming;
mod upstream;

#[cfg(test)]
mod test_support;

pub use error::{describe_failure, ProxyError};
pub use handler::ProxyHandler;
pub use server::{build_router, run_server, ProxyState};
pub use streaming::STREAM_INTERRUPTED_EVENT;
pub use upstream::{build_http_client, send_chat};
