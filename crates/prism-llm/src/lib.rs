//! Vendor-neutral client core for generative-text APIs
//!
//! Normalizes `OpenAI`, Anthropic, and Google wire formats into one canonical
//! request/response/event model, with SSE parsing, tool call reassembly, and
//! cooperative cancellation for streamed responses.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod accumulator;
pub mod context;
pub mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod sse;
pub mod transport;
pub mod types;

pub use accumulator::ToolCallAccumulator;
pub use context::StreamContext;
pub use error::LlmError;
pub use provider::{EventStream, Provider, ProviderCapabilities, StreamingProvider, stream};
pub use registry::ProviderRegistry;
pub use sse::{SseDecoder, SseFrame, SseStream};
pub use transport::{ByteStream, HttpTransport, HttpTransportBuilder, StreamTransport, Transport};
pub use types::*;
