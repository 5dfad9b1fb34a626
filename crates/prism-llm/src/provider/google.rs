//! Google Generative Language API provider implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use prism_config::GoogleConfig;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{EventStream, Provider, ProviderCapabilities, StreamingProvider};
use crate::context::StreamContext;
use crate::convert::google::{GoogleStreamState, response_from_google};
use crate::error::LlmError;
use crate::protocol::google::{GoogleRequest, GoogleResponse};
use crate::transport::Transport;
use crate::types::{GenerationRequest, GenerationResponse};

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini provider
pub struct GoogleProvider {
    name: String,
    transport: Arc<dyn Transport>,
    base_url: Url,
    api_key: Option<SecretString>,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl GoogleProvider {
    /// Create from provider configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the default base URL fails to parse or
    /// the configured timeout is not a valid duration
    pub fn new(name: impl Into<String>, config: &GoogleConfig, transport: Arc<dyn Transport>) -> Result<Self, LlmError> {
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
            headers,
            timeout,
        })
    }

    /// Build the `generateContent` URL
    fn generate_url(&self, model: &str) -> String {
        super::endpoint(&self.base_url, &format!("models/{model}:generateContent"))
    }

    /// Build the SSE `streamGenerateContent` URL
    fn stream_url(&self, model: &str) -> String {
        super::endpoint(&self.base_url, &format!("models/{model}:streamGenerateContent?alt=sse"))
    }

    fn request_headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = self.headers.clone();
        if let Some(key) = &self.api_key {
            super::insert_header(&mut headers, "x-goog-api-key", key.expose_secret(), true)?;
        }
        Ok(headers)
    }
}

#[async_trait]
impl Provider for GoogleProvider {
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
            max_context_tokens: Some(1_048_576),
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let wire_request = GoogleRequest::from(request);
        let body = serde_json::to_value(&wire_request).map_err(|e| LlmError::Internal(e.into()))?;

        tracing::debug!(provider = %self.name, model = %request.model(), "sending generateContent request");

        let raw = self
            .transport
            .post(&self.generate_url(request.model()), self.request_headers()?, &body)
            .await?;

        let wire_response: GoogleResponse = serde_json::from_value(raw.clone())
            .map_err(|e| LlmError::MalformedResponseBody(format!("failed to parse response: {e}")))?;

        response_from_google(wire_response, request.model(), raw)
    }

    fn as_streaming(&self) -> Option<&dyn StreamingProvider> {
        Some(self)
    }
}

#[async_trait]
impl StreamingProvider for GoogleProvider {
    async fn stream(&self, request: &GenerationRequest, context: StreamContext) -> Result<EventStream, LlmError> {
        let transport = super::stream_transport(&self.name, self.transport.as_ref())?;
        let context = super::with_default_timeout(context, self.timeout);

        let wire_request = GoogleRequest::from(request);
        let body = serde_json::to_value(&wire_request).map_err(|e| LlmError::Internal(e.into()))?;

        tracing::debug!(provider = %self.name, model = %request.model(), "opening streamGenerateContent");

        let bytes = transport
            .stream_post(&self.stream_url(request.model()), self.request_headers()?, &body, &context)
            .await?;

        Ok(EventStream::new(bytes, GoogleStreamState::new(), context))
    }
}
