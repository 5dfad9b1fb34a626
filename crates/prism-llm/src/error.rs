use http::StatusCode;
use thiserror::Error;

/// Errors that can occur during LLM operations
///
/// Cancellation is not represented here: a cancelled stream simply ends.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Vendor answered with a non-2xx status
    #[error("provider returned {status}: {body}")]
    Transport {
        /// HTTP status code
        status: StatusCode,
        /// Raw response body
        body: String,
    },

    /// Request never produced an HTTP status (connect, TLS, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Body or stream frame was not decodable JSON of the expected shape
    #[error("malformed response body: {0}")]
    MalformedResponseBody(String),

    /// Concatenated tool call arguments did not parse as JSON
    #[error("malformed arguments for tool call at index {index}: {source}")]
    MalformedToolArguments {
        /// Index of the offending tool call
        index: u32,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },

    /// Provider or transport lacks the requested capability
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// Vendor reported an error inside an otherwise successful response
    #[error("provider error: {0}")]
    Provider(String),

    /// Canonical request violates an invariant
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Named provider does not exist in the registry
    #[error("provider not found: {provider}")]
    ProviderNotFound { provider: String },

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Whether a caller-side retry could plausibly succeed
    ///
    /// Advisory only; nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status, .. } => *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            Self::Network(_) => true,
            _ => false,
        }
    }

    /// HTTP status carried by a transport error
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}
