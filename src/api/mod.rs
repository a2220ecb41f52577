//! Chat completion API types

pub mod chat;

pub use chat::{is_truthy, ChatRequest, UpstreamPayload};
