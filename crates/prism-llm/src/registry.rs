//! Named provider instances built from configuration

use std::sync::Arc;

use indexmap::IndexMap;
use prism_config::{LlmConfig, LlmProviderConfig};

use crate::error::LlmError;
use crate::provider::Provider;
use crate::provider::anthropic::AnthropicProvider;
use crate::provider::google::GoogleProvider;
use crate::provider::openai::OpenAiProvider;
use crate::transport::Transport;

/// Providers keyed by their configured name, in configuration order
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured provider over a shared transport
    ///
    /// # Errors
    ///
    /// Returns an error if any provider fails to initialize
    pub fn from_config(config: &LlmConfig, transport: Arc<dyn Transport>) -> Result<Self, LlmError> {
        let mut registry = Self::new();

        for (name, provider_config) in &config.providers {
            let transport = Arc::clone(&transport);
            let provider: Arc<dyn Provider> = match provider_config {
                LlmProviderConfig::Openai(cfg) => Arc::new(OpenAiProvider::new(name.clone(), cfg, transport)?),
                LlmProviderConfig::Anthropic(cfg) => Arc::new(AnthropicProvider::new(name.clone(), cfg, transport)?),
                LlmProviderConfig::Google(cfg) => Arc::new(GoogleProvider::new(name.clone(), cfg, transport)?),
            };

            tracing::info!(provider = %name, kind = provider_config.kind(), "registered LLM provider");
            registry.insert(provider);
        }

        Ok(registry)
    }

    /// Add a provider under its own name, replacing any previous entry
    pub fn insert(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.name().to_owned(), provider);
    }

    /// Look up a provider by name
    ///
    /// # Errors
    ///
    /// Returns `LlmError::ProviderNotFound` if no provider has that name
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>, LlmError> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| LlmError::ProviderNotFound {
                provider: name.to_owned(),
            })
    }

    /// First provider in configuration order
    pub fn default_provider(&self) -> Option<Arc<dyn Provider>> {
        self.providers.first().map(|(_, provider)| Arc::clone(provider))
    }

    /// Provider names in configuration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Providers in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Provider>)> {
        self.providers.iter().map(|(name, provider)| (name.as_str(), provider))
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.providers.keys()).finish()
    }
}
