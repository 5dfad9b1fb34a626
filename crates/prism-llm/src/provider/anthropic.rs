//! Anthropic Messages API provider implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use prism_config::AnthropicConfig;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{EventStream, Provider, ProviderCapabilities, StreamingProvider};
use crate::context::StreamContext;
use crate::convert::anthropic::{AnthropicStreamState, response_from_anthropic, to_anthropic_request};
use crate::error::LlmError;
use crate::protocol::anthropic::{AnthropicRequest, AnthropicResponse};
use crate::transport::Transport;
use crate::types::{GenerationRequest, GenerationResponse};

/// Default Anthropic API base URL
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    name: String,
    transport: Arc<dyn Transport>,
    base_url: Url,
    api_key: Option<SecretString>,
    api_version: String,
    beta: Option<String>,
    default_max_tokens: u32,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl AnthropicProvider {
    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the default base URL fails to parse or
    /// the configured timeout is not a valid duration
    pub fn new(
        name: impl Into<String>,
        config: &AnthropicConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, LlmError> {
        let name = name.into();
        let base_url = match &config.common.base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| LlmError::Internal(e.into()))?,
        };

        let headers = super::extra_headers(&name, &config.common.headers);
        let timeout = config.common.timeout()?;

        Ok(Self {
            name,
            transport,
            base_url,
            api_key: config.common.api_key.clone(),
            api_version: config.api_version.clone(),
            beta: (!config.beta.is_empty()).then(|| config.beta.join(",")),
            default_max_tokens: config.default_max_tokens,
            headers,
            timeout,
        })
    }

    /// Build the messages URL
    fn messages_url(&self) -> String {
        super::endpoint(&self.base_url, "messages")
    }

    fn request_headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = self.headers.clone();

        if let Some(key) = &self.api_key {
            super::insert_header(&mut headers, "x-api-key", key.expose_secret(), true)?;
        }
        super::insert_header(&mut headers, "anthropic-version", &self.api_version, false)?;
        if let Some(beta) = &self.beta {
            super::insert_header(&mut headers, "anthropic-beta", beta, false)?;
        }

        Ok(headers)
    }

    fn wire_request(&self, request: &GenerationRequest) -> AnthropicRequest {
        to_anthropic_request(request, self.default_max_tokens)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_tools: true,
            supports_json_mode: false,
            supports_streaming: true,
            supports_vision: true,
            supports_system_prompt: true,
            max_context_tokens: Some(200_000),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let wire_request = self.wire_request(request);
        let body = serde_json::to_value(&wire_request).map_err(|e| LlmError::Internal(e.into()))?;

        tracing::debug!(provider = %self.name, model = %wire_request.model, "sending messages request");

        let raw = self
            .transport
            .post(&self.messages_url(), self.request_headers()?, &body)
            .await?;

        let wire_response: AnthropicResponse = serde_json::from_value(raw.clone())
            .map_err(|e| LlmError::MalformedResponseBody(format!("failed to parse response: {e}")))?;

        Ok(response_from_anthropic(wire_response, raw))
    }

    fn as_streaming(&self) -> Option<&dyn StreamingProvider> {
        Some(self)
    }
}

#[async_trait]
impl StreamingProvider for AnthropicProvider {
    async fn stream(&self, request: &GenerationRequest, context: StreamContext) -> Result<EventStream, LlmError> {
        let transport = super::stream_transport(&self.name, self.transport.as_ref())?;
        let context = super::with_default_timeout(context, self.timeout);

        let mut wire_request = self.wire_request(request);
        wire_request.stream = Some(true);

        let body = serde_json::to_value(&wire_request).map_err(|e| LlmError::Internal(e.into()))?;

        tracing::debug!(provider = %self.name, model = %wire_request.model, "opening messages stream");

        let bytes = transport
            .stream_post(&self.messages_url(), self.request_headers()?, &body, &context)
            .await?;

        Ok(EventStream::new(bytes, AnthropicStreamState::new(), context))
    }
}
