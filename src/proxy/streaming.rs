//! Streaming response relay (SSE)
//!
//! Upstream bytes are forwarded untouched: the provider's SSE framing is
//! opaque here. The relay ends when the upstream ends, or after a single
//! synthetic error event when the upstream fails mid-stream.

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use std::convert::Infallible;
use std::fmt::Display;
use std::pin::Pin;
use std::time::Instant;

use super::cors;

/// Event written when the upstream stream breaks after headers were sent
pub const STREAM_INTERRUPTED_EVENT: &str = "data: {\"error\": \"Streaming interrupted\"}\n\n";

struct RelayState<S> {
    upstream: Pin<Box<S>>,
    chunks: usize,
    bytes: usize,
    start: Instant,
}

/// Pump an upstream byte stream into a response body stream.
///
/// Chunks come out in arrival order and unmodified. A transport error is
/// replaced by [`STREAM_INTERRUPTED_EVENT`] and ends the relay, so the
/// caller's body always terminates cleanly.
pub fn relay_stream<S, E>(upstream: S) -> impl Stream<Item = Result<Bytes, Infallible>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = RelayState {
        upstream: Box::pin(upstream),
        chunks: 0,
        bytes: 0,
        start: Instant::now(),
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        match state.upstream.next().await {
            Some(Ok(chunk)) => {
                state.chunks += 1;
                state.bytes += chunk.len();
                tracing::trace!(chunk = state.chunks, len = chunk.len(), "Relaying stream chunk");
                Some((Ok(chunk), Some(state)))
            }
            Some(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    chunks = state.chunks,
                    bytes = state.bytes,
                    "Upstream stream interrupted"
                );
                Some((Ok(Bytes::from_static(STREAM_INTERRUPTED_EVENT.as_bytes())), None))
            }
            None => {
                tracing::debug!(
                    chunks = state.chunks,
                    bytes = state.bytes,
                    duration_ms = state.start.elapsed().as_millis() as u64,
                    "Stream relay completed"
                );
                None
            }
        }
    })
}

/// Build the event-stream response around a relayed upstream body
pub fn sse_response<S, E>(upstream: S) -> Response
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let mut response = Response::new(Body::from_stream(relay_stream(upstream)));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    cors::apply(headers, cors::STREAM_ALLOW_HEADERS);

    response
}
