use std::path::Path;

use http::HeaderName;

use crate::{Config, LlmProviderConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured or a provider's
    /// settings are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.providers.is_empty() {
            anyhow::bail!("at least one LLM provider must be configured");
        }

        for (name, provider) in &self.llm.providers {
            validate_provider(name, provider)?;
        }

        Ok(())
    }
}

/// Validate a single provider entry
fn validate_provider(name: &str, provider: &LlmProviderConfig) -> anyhow::Result<()> {
    let common = provider.common();

    if let Some(url) = &common.base_url
        && !matches!(url.scheme(), "http" | "https")
    {
        anyhow::bail!("provider '{name}' base_url must use http or https, got '{}'", url.scheme());
    }

    common
        .timeout()
        .map_err(|e| anyhow::anyhow!("provider '{name}' has an invalid timeout: {e}"))?;

    for header in common.headers.keys() {
        HeaderName::try_from(header.as_str())
            .map_err(|e| anyhow::anyhow!("provider '{name}' has an invalid header name '{header}': {e}"))?;
    }

    if let LlmProviderConfig::Anthropic(anthropic) = provider
        && anthropic.default_max_tokens == 0
    {
        anyhow::bail!("provider '{name}' default_max_tokens must be greater than 0");
    }

    Ok(())
}
