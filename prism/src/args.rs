use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Prism LLM client
#[derive(Debug, Parser)]
#[command(name = "prism", about = "Send one prompt to a configured LLM provider")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "prism.toml", env = "PRISM_CONFIG")]
    pub config: PathBuf,

    /// Provider key from the configuration (defaults to the first one)
    #[arg(short, long, env = "PRISM_PROVIDER")]
    pub provider: Option<String>,

    /// Model identifier (defaults to the provider's `default_model`)
    #[arg(short, long, env = "PRISM_MODEL")]
    pub model: Option<String>,

    /// System prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Stream the response as it is generated
    #[arg(short, long)]
    pub stream: bool,

    /// Request timeout (e.g. "30s", "2m")
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Prompt text
    pub prompt: String,
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    duration_str::parse(value)
}
