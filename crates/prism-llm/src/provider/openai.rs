//! OpenAI-compatible provider implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use prism_config::OpenAiConfig;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{EventStream, Provider, ProviderCapabilities, StreamingProvider};
use crate::context::StreamContext;
use crate::convert::openai::{OpenAiStreamDecoder, response_from_openai};
use crate::error::LlmError;
use crate::protocol::openai::{OpenAiRequest, OpenAiResponse, OpenAiStreamOptions};
use crate::transport::Transport;
use crate::types::{GenerationRequest, GenerationResponse};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Whether the provider is the canonical `OpenAI` API (vs a compatible third-party)
fn is_canonical_openai(base_url: &Url) -> bool {
    base_url.host_str().is_some_and(|h| h == "api.openai.com")
}

/// OpenAI-compatible provider
pub struct OpenAiProvider {
    name: String,
    transport: Arc<dyn Transport>,
    base_url: Url,
    api_key: Option<SecretString>,
    organization: Option<String>,
    include_stream_usage: bool,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl OpenAiProvider {
    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the default base URL fails to parse or
    /// the configured timeout is not a valid duration
    pub fn new(name: impl Into<String>, config: &OpenAiConfig, transport: Arc<dyn Transport>) -> Result<Self, LlmError> {
        let name = name.into();
        let base_url = match &config.common.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| LlmError::Internal(e.into()))?,
        };

        // many compatible APIs reject the unsupported `stream_options` field
        let include_stream_usage = config
            .include_stream_usage
            .unwrap_or_else(|| is_canonical_openai(&base_url));

        let headers = super::extra_headers(&name, &config.common.headers);
        let timeout = config.common.timeout()?;

        Ok(Self {
            name,
            transport,
            base_url,
            api_key: config.common.api_key.clone(),
            organization: config.organization.clone(),
            include_stream_usage,
            headers,
            timeout,
        })
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        super::endpoint(&self.base_url, "chat/completions")
    }

    fn request_headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = self.headers.clone();

        if let Some(key) = &self.api_key {
            let bearer = format!("Bearer {}", key.expose_secret());
            super::insert_header(&mut headers, "authorization", &bearer, true)?;
        }
        if let Some(organization) = &self.organization {
            super::insert_header(&mut headers, "openai-organization", organization, false)?;
        }

        Ok(headers)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_tools: true,
            supports_json_mode: true,
            supports_streaming: true,
            supports_vision: true,
            supports_system_prompt: true,
            max_context_tokens: Some(128_000),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let wire_request = OpenAiRequest::from(request);
        let body = serde_json::to_value(&wire_request).map_err(|e| LlmError::Internal(e.into()))?;

        tracing::debug!(provider = %self.name, model = %wire_request.model, "sending completion request");

        let raw = self
            .transport
            .post(&self.completions_url(), self.request_headers()?, &body)
            .await?;

        let wire_response: OpenAiResponse = serde_json::from_value(raw.clone())
            .map_err(|e| LlmError::MalformedResponseBody(format!("failed to parse response: {e}")))?;

        response_from_openai(wire_response, raw)
    }

    fn as_streaming(&self) -> Option<&dyn StreamingProvider> {
        Some(self)
    }
}

#[async_trait]
impl StreamingProvider for OpenAiProvider {
    async fn stream(&self, request: &GenerationRequest, context: StreamContext) -> Result<EventStream, LlmError> {
        let transport = super::stream_transport(&self.name, self.transport.as_ref())?;
        let context = super::with_default_timeout(context, self.timeout);

        let mut wire_request = OpenAiRequest::from(request);
        wire_request.stream = Some(true);
        wire_request.stream_options = self
            .include_stream_usage
            .then_some(OpenAiStreamOptions { include_usage: true });

        let body = serde_json::to_value(&wire_request).map_err(|e| LlmError::Internal(e.into()))?;

        tracing::debug!(provider = %self.name, model = %wire_request.model, "opening completion stream");

        let bytes = transport
            .stream_post(&self.completions_url(), self.request_headers()?, &body, &context)
            .await?;

        Ok(EventStream::new(bytes, OpenAiStreamDecoder, context))
    }
}
