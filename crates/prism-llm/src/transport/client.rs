//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use http::HeaderMap;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use super::{ByteStream, StreamTransport, Transport};
use crate::context::StreamContext;
use crate::error::LlmError;

const DEFAULT_USER_AGENT: &str = concat!("prism/", env!("CARGO_PKG_VERSION"));

/// HTTP transport over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Transport with default client settings
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the TLS backend fails to initialize
    pub fn new() -> Result<Self, LlmError> {
        Self::builder().build()
    }

    /// Start configuring a transport
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Wrap an existing client
    pub const fn from_client(client: Client) -> Self {
        Self { client, timeout: None }
    }

    fn request(&self, url: &str, headers: HeaderMap, body: &Value, timeout: Option<Duration>) -> RequestBuilder {
        let builder = self.client.post(url).headers(headers).json(body);

        match timeout.or(self.timeout) {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    async fn send(&self, url: &str, builder: RequestBuilder) -> Result<Response, LlmError> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(url, error = %e, "upstream request failed");
            LlmError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url, status = %status, error = %e, "failed to read error response body");
                String::new()
            }
        };
        tracing::warn!(url, status = %status, "upstream returned error");

        Err(LlmError::Transport { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, headers: HeaderMap, body: &Value) -> Result<Value, LlmError> {
        let builder = self.request(url, headers, body, None);
        let response = self.send(url, builder).await?;

        let bytes = response.bytes().await.map_err(|e| LlmError::Network(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::warn!(url, error = %e, "response body is not JSON");
            LlmError::MalformedResponseBody(e.to_string())
        })
    }

    fn as_stream_transport(&self) -> Option<&dyn StreamTransport> {
        Some(self)
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn stream_post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &Value,
        context: &StreamContext,
    ) -> Result<ByteStream, LlmError> {
        let builder = self.request(url, headers, body, context.timeout());
        let response = self.send(url, builder).await?;

        tracing::debug!(url, "stream opened");

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| LlmError::Network(e.to_string())));

        Ok(Box::pin(stream))
    }
}

/// Builder for [`HttpTransport`]
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HttpTransportBuilder {
    /// Limit on establishing a connection
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Request timeout used when the caller supplies none
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the `User-Agent` header
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the transport
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Internal` if the underlying client cannot be built
    pub fn build(self) -> Result<HttpTransport, LlmError> {
        let mut builder = Client::builder().user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::Internal(anyhow::anyhow!("failed to build HTTP client: {e}")))?;

        Ok(HttpTransport {
            client,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_default_timeout() {
        let transport = HttpTransport::builder()
            .timeout(Duration::from_secs(3))
            .connect_timeout(Duration::from_secs(1))
            .user_agent("test-agent")
            .build()
            .unwrap();

        assert_eq!(transport.timeout, Some(Duration::from_secs(3)));
        assert!(transport.as_stream_transport().is_some());
    }
}
