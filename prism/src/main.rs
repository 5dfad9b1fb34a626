#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use args::Args;
use clap::Parser;
use prism_config::Config;
use prism_llm::{
    GenerationRequest, GenerationResponse, HttpTransport, Message, Provider, ProviderRegistry, StreamContext,
    StreamEvent, ToolCall, UsageInfo,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize telemetry
    prism_telemetry::init(config.telemetry.as_ref(), "warn")?;

    tracing::debug!(config_path = %args.config.display(), "starting prism");

    let (key, provider_config) = match &args.provider {
        Some(key) => config
            .llm
            .providers
            .get_key_value(key)
            .with_context(|| format!("provider '{key}' is not configured"))?,
        None => config.llm.providers.first().context("no providers configured")?,
    };

    let model = args
        .model
        .clone()
        .or_else(|| provider_config.common().default_model.clone())
        .with_context(|| format!("no --model given and provider '{key}' has no default_model"))?;

    let mut transport = HttpTransport::builder();
    if let Some(timeout) = args.timeout.or(provider_config.common().timeout()?) {
        transport = transport.timeout(timeout);
    }

    let registry = ProviderRegistry::from_config(&config.llm, Arc::new(transport.build()?))?;
    let provider = registry.get(key)?;

    let request = build_request(&args, model)?;

    if args.stream {
        run_stream(provider.as_ref(), &request).await
    } else {
        let response = provider.generate(&request).await?;
        print_response(&response);
        Ok(())
    }
}

fn build_request(args: &Args, model: String) -> anyhow::Result<GenerationRequest> {
    let mut builder = GenerationRequest::builder(model).message(Message::user(args.prompt.clone()));

    if let Some(system) = &args.system {
        builder = builder.system_prompt(system.clone());
    }
    if let Some(temperature) = args.temperature {
        builder = builder.temperature(temperature);
    }
    if let Some(max_tokens) = args.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }

    Ok(builder.build()?)
}

/// Stream a response to stdout until it completes or Ctrl+C is pressed
async fn run_stream(provider: &dyn Provider, request: &GenerationRequest) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupt received, cancelling stream");
                cancel_clone.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "failed to install Ctrl+C handler"),
        }
    });

    let context = StreamContext::new().with_cancellation_token(cancel.clone());
    let mut events = prism_llm::stream(provider, request, context).await?;
    let mut stdout = std::io::stdout();

    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::TextDelta { text } => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            StreamEvent::ToolCallDelta(_) => {}
            StreamEvent::ToolCallsReady { tool_calls } => {
                writeln!(stdout)?;
                print_tool_calls(&tool_calls);
            }
            StreamEvent::StreamCompleted { finish_reason, usage } => {
                writeln!(stdout)?;
                if let Some(reason) = finish_reason {
                    tracing::debug!(?reason, "stream completed");
                }
                if let Some(usage) = usage {
                    print_usage(&usage);
                }
            }
        }
    }

    if cancel.is_cancelled() {
        eprintln!("[cancelled]");
    }

    Ok(())
}

fn print_response(response: &GenerationResponse) {
    if let Some(text) = &response.text {
        println!("{text}");
    }
    print_tool_calls(&response.tool_calls);
    if let Some(usage) = &response.usage {
        print_usage(usage);
    }
}

fn print_tool_calls(tool_calls: &[ToolCall]) {
    for call in tool_calls {
        println!("tool call {} [{}]: {}", call.name, call.id, call.arguments_json());
    }
}

fn print_usage(usage: &UsageInfo) {
    eprintln!(
        "usage: {} input, {} output, {} total tokens",
        usage.input_tokens, usage.output_tokens, usage.total_tokens
    );
}
