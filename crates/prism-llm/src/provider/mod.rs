//! Provider trait and implementations for LLM backends

pub mod anthropic;
pub mod google;
pub mod openai;
pub mod stream;

use std::time::Duration;

use async_trait::async_trait;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use indexmap::IndexMap;
use url::Url;

pub use self::stream::{ChunkDecoder, DecodedChunk, EventStream};
use crate::context::StreamContext;
use crate::error::LlmError;
use crate::types::{GenerationRequest, GenerationResponse};

/// Capabilities advertised by a provider
///
/// Advisory: adapters do not refuse requests that use an unadvertised
/// feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ProviderCapabilities {
    /// Tool/function calling
    pub supports_tools: bool,
    /// Native JSON output mode
    pub supports_json_mode: bool,
    /// Streaming responses
    pub supports_streaming: bool,
    /// Image inputs
    pub supports_vision: bool,
    /// Dedicated system prompt slot
    pub supports_system_prompt: bool,
    /// Largest context window across the vendor's models, if known
    pub max_context_tokens: Option<u32>,
}

/// Trait implemented by each LLM provider backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry key of this provider
    fn name(&self) -> &str;

    /// Advertised capabilities
    fn capabilities(&self) -> ProviderCapabilities;

    /// Send a single-shot generation request
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError>;

    /// Streaming capability, if this provider has one
    fn as_streaming(&self) -> Option<&dyn StreamingProvider> {
        None
    }
}

/// Provider that can stream responses
#[async_trait]
pub trait StreamingProvider: Provider {
    /// Open a streaming generation
    ///
    /// Fails before any event is produced when the vendor rejects the call.
    async fn stream(&self, request: &GenerationRequest, context: StreamContext) -> Result<EventStream, LlmError>;
}

/// Stream through `provider`, or fail if it cannot stream
///
/// # Errors
///
/// Returns `LlmError::UnsupportedCapability` when the provider has no
/// streaming support, otherwise whatever opening the stream returns
pub async fn stream(
    provider: &dyn Provider,
    request: &GenerationRequest,
    context: StreamContext,
) -> Result<EventStream, LlmError> {
    let Some(streaming) = provider.as_streaming() else {
        return Err(LlmError::UnsupportedCapability(format!(
            "provider '{}' does not support streaming",
            provider.name()
        )));
    };
    streaming.stream(request, context).await
}

/// Join a path onto a configured base URL
pub(crate) fn endpoint(base_url: &Url, path: &str) -> String {
    let base = base_url.as_str().trim_end_matches('/');
    format!("{base}/{}", path.trim_start_matches('/'))
}

/// Convert configured extra headers into a header map
///
/// Best-effort: entries that are not valid header names or values are
/// logged and skipped.
pub(crate) fn extra_headers(provider: &str, headers: &IndexMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::warn!(provider, header = %name, "skipping invalid configured header"),
        }
    }

    map
}

/// Insert a header whose value comes from configuration or secrets
///
/// Sensitive values are masked in `Debug` output of the header map.
pub(crate) fn insert_header(
    headers: &mut HeaderMap,
    name: &'static str,
    value: &str,
    sensitive: bool,
) -> Result<(), LlmError> {
    let mut value = HeaderValue::try_from(value)
        .map_err(|_| LlmError::InvalidRequest(format!("value for header '{name}' is not a valid header value")))?;
    value.set_sensitive(sensitive);
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

/// Apply a provider's configured timeout when the caller set none
pub(crate) fn with_default_timeout(context: StreamContext, timeout: Option<Duration>) -> StreamContext {
    match timeout {
        Some(timeout) if context.timeout().is_none() => context.with_timeout(timeout),
        _ => context,
    }
}

/// Require a streaming-capable transport
pub(crate) fn stream_transport<'a>(
    provider: &str,
    transport: &'a dyn crate::transport::Transport,
) -> Result<&'a dyn crate::transport::StreamTransport, LlmError> {
    transport.as_stream_transport().ok_or_else(|| {
        LlmError::UnsupportedCapability(format!("transport used by provider '{provider}' cannot stream"))
    })
}
