//! Transport boundary between adapters and HTTP
//!
//! Adapters build URLs, headers, and JSON bodies; a transport performs the
//! call.

mod client;
#[cfg(test)]
pub(crate) mod mock;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use http::HeaderMap;
use serde_json::Value;

pub use client::{HttpTransport, HttpTransportBuilder};
use crate::context::StreamContext;
use crate::error::LlmError;

/// Raw response body of a streaming call
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

/// Single-shot JSON POST
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON and decode the JSON response
    ///
    /// # Errors
    ///
    /// `LlmError::Transport` for a non-2xx status, `LlmError::Network` when
    /// no status was received, `LlmError::MalformedResponseBody` when the
    /// body is not JSON
    async fn post(&self, url: &str, headers: HeaderMap, body: &Value) -> Result<Value, LlmError>;

    /// Streaming capability, if this transport has one
    fn as_stream_transport(&self) -> Option<&dyn StreamTransport> {
        None
    }
}

/// Streaming JSON POST
#[async_trait]
pub trait StreamTransport: Transport {
    /// POST `body` as JSON and hand back the raw response body
    ///
    /// Applies `context.timeout()` to the whole request.
    ///
    /// # Errors
    ///
    /// `LlmError::Transport` for a non-2xx status, raised before any body
    /// bytes are handed out
    async fn stream_post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &Value,
        context: &StreamContext,
    ) -> Result<ByteStream, LlmError>;
}
