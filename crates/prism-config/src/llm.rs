use std::time::Duration;

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default `max_tokens` sent to Anthropic when a request leaves it unset
pub const DEFAULT_ANTHROPIC_MAX_TOKENS: u32 = 4096;

/// Default Anthropic API version header value
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Top-level LLM configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// LLM provider configurations keyed by name, in file order
    #[serde(default)]
    pub providers: IndexMap<String, LlmProviderConfig>,
}

/// Configuration for a single LLM provider, tagged by its wire protocol
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmProviderConfig {
    /// OpenAI chat completions API (or a compatible third party)
    Openai(OpenAiConfig),
    /// Anthropic Messages API
    Anthropic(AnthropicConfig),
    /// Google Generative Language API
    Google(GoogleConfig),
}

impl LlmProviderConfig {
    /// Settings shared by every provider type
    pub const fn common(&self) -> &CommonProviderConfig {
        match self {
            Self::Openai(c) => &c.common,
            Self::Anthropic(c) => &c.common,
            Self::Google(c) => &c.common,
        }
    }

    /// Protocol identifier (`openai`, `anthropic`, `google`)
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Openai(_) => "openai",
            Self::Anthropic(_) => "anthropic",
            Self::Google(_) => "google",
        }
    }
}

/// Settings shared by every provider type
#[derive(Debug, Default, Deserialize)]
pub struct CommonProviderConfig {
    /// API key for authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model used when the caller does not name one
    #[serde(default)]
    pub default_model: Option<String>,
    /// Request timeout (e.g. "30s", "2m")
    #[serde(default)]
    pub timeout: Option<String>,
    /// Static headers added to every request
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl CommonProviderConfig {
    /// Parse the configured timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is not understood
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|s| duration_str::parse(s).map_err(|e| anyhow::anyhow!("invalid duration '{s}': {e}")))
            .transpose()
    }
}

/// OpenAI-specific provider options
#[derive(Debug, Default, Deserialize)]
pub struct OpenAiConfig {
    /// Shared provider settings
    #[serde(flatten)]
    pub common: CommonProviderConfig,
    /// Value for the `OpenAI-Organization` header
    #[serde(default)]
    pub organization: Option<String>,
    /// Request usage on the final stream chunk via `stream_options`
    ///
    /// Defaults to on for `api.openai.com` and off elsewhere, since many
    /// compatible APIs reject the parameter
    #[serde(default)]
    pub include_stream_usage: Option<bool>,
}

/// Anthropic-specific provider options
#[derive(Debug, Deserialize)]
pub struct AnthropicConfig {
    /// Shared provider settings
    #[serde(flatten)]
    pub common: CommonProviderConfig,
    /// `anthropic-version` header value
    #[serde(default = "default_anthropic_version")]
    pub api_version: String,
    /// `max_tokens` used when a request does not set one (the API requires it)
    #[serde(default = "default_anthropic_max_tokens")]
    pub default_max_tokens: u32,
    /// Values joined into the `anthropic-beta` header
    #[serde(default)]
    pub beta: Vec<String>,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            common: CommonProviderConfig::default(),
            api_version: default_anthropic_version(),
            default_max_tokens: DEFAULT_ANTHROPIC_MAX_TOKENS,
            beta: Vec::new(),
        }
    }
}

fn default_anthropic_version() -> String {
    DEFAULT_ANTHROPIC_VERSION.to_owned()
}

const fn default_anthropic_max_tokens() -> u32 {
    DEFAULT_ANTHROPIC_MAX_TOKENS
}

/// Google-specific provider options
#[derive(Debug, Default, Deserialize)]
pub struct GoogleConfig {
    /// Shared provider settings
    #[serde(flatten)]
    pub common: CommonProviderConfig,
}
