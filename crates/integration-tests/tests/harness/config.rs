//! Configuration for providers pointed at a mock vendor

use std::fmt::Write;
use std::sync::Arc;

use prism_config::Config;
use prism_llm::{HttpTransport, Provider, ProviderRegistry};

/// Builds a TOML document and loads it through the real config loader
#[derive(Default)]
pub struct ConfigBuilder {
    toml: String,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider section of the given type
    pub fn with_provider(mut self, name: &str, kind: &str, base_url: &str) -> Self {
        write!(
            self.toml,
            "[llm.providers.{name}]\ntype = \"{kind}\"\napi_key = \"test-key\"\nbase_url = \"{base_url}\"\n\n"
        )
        .ok();
        self
    }

    /// Add a provider section with extra raw TOML lines
    pub fn with_provider_extra(mut self, name: &str, kind: &str, base_url: &str, extra: &str) -> Self {
        self = self.with_provider(name, kind, base_url);
        self.toml.insert_str(self.toml.len() - 1, &format!("{extra}\n"));
        self
    }

    pub fn build(self) -> Config {
        Config::from_toml(&self.toml).expect("test config should load")
    }
}

/// Look up one provider from a registry over a real HTTP transport
pub fn provider(config: &Config, name: &str) -> Arc<dyn Provider> {
    let transport = HttpTransport::new().expect("transport should build");
    ProviderRegistry::from_config(&config.llm, Arc::new(transport))
        .expect("registry should build")
        .get(name)
        .expect("provider should be registered")
}
