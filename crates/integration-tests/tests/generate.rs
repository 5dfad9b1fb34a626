mod harness;

use std::sync::Arc;
use std::time::Duration;

use harness::config::{ConfigBuilder, provider};
use harness::mock_vendor::{MockVendor, Reply};
use prism_llm::{
    FinishReason, GenerationRequest, HttpTransport, LlmError, Message, ProviderRegistry, ToolDefinition, UsageInfo,
};
use serde_json::json;

fn request(model: &str) -> GenerationRequest {
    GenerationRequest::builder(model)
        .system_prompt("Be brief.")
        .message(Message::user("Hello"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn openai_generate_over_http() {
    let vendor = MockVendor::start([Reply::Json(json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o-mini",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi!"}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 7, "completion_tokens": 2, "total_tokens": 9}
    }))])
    .await
    .unwrap();
    let config = ConfigBuilder::new()
        .with_provider("gpt", "openai", &vendor.url("/v1"))
        .build();

    let response = provider(&config, "gpt").generate(&request("gpt-4o-mini")).await.unwrap();

    assert_eq!(response.text.as_deref(), Some("Hi!"));
    assert_eq!(response.finish_reason, Some(FinishReason::Stop));
    assert_eq!(response.usage, Some(UsageInfo::new(7, 2, Some(9))));

    let requests = vendor.requests();
    assert_eq!(requests[0].path, "/v1/chat/completions");
    assert_eq!(requests[0].headers["authorization"], "Bearer test-key");
    assert_eq!(requests[0].body["messages"][0], json!({"role": "system", "content": "Be brief."}));
}

#[tokio::test]
async fn anthropic_unauthorized_surfaces_status() {
    let vendor = MockVendor::start([Reply::Status(
        401,
        r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#.to_owned(),
    )])
    .await
    .unwrap();
    let config = ConfigBuilder::new()
        .with_provider("claude", "anthropic", &vendor.url("/v1"))
        .build();

    let err = provider(&config, "claude")
        .generate(&request("claude-sonnet-4"))
        .await
        .unwrap_err();

    let LlmError::Transport { status, body } = &err else {
        panic!("expected transport error, got {err:?}");
    };
    assert_eq!(status.as_u16(), 401);
    assert!(body.contains("authentication_error"));
    assert!(!err.is_retryable());

    let requests = vendor.requests();
    assert_eq!(requests[0].path, "/v1/messages");
    assert_eq!(requests[0].headers["x-api-key"], "test-key");
    assert_eq!(requests[0].body["system"], json!("Be brief."));
}

#[tokio::test]
async fn rate_limit_is_retryable() {
    let vendor = MockVendor::start([Reply::Status(429, "slow down".to_owned())])
        .await
        .unwrap();
    let config = ConfigBuilder::new()
        .with_provider("gpt", "openai", &vendor.url("/v1"))
        .build();

    let err = provider(&config, "gpt").generate(&request("gpt-4o-mini")).await.unwrap_err();

    assert_eq!(err.status().unwrap().as_u16(), 429);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn google_tool_call_over_http() {
    let vendor = MockVendor::start([Reply::Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"functionCall": {"name": "get_weather", "args": {"city": "Oslo"}}}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17}
    }))])
    .await
    .unwrap();
    let config = ConfigBuilder::new()
        .with_provider("gemini", "google", &vendor.url("/v1beta"))
        .build();
    let request = GenerationRequest::builder("gemini-2.0-flash")
        .message(Message::user("Weather in Oslo?"))
        .tool(ToolDefinition::new(
            "get_weather",
            "Current weather",
            json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        ))
        .build()
        .unwrap();

    let response = provider(&config, "gemini").generate(&request).await.unwrap();

    assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].id, "call_0");
    assert_eq!(response.tool_calls[0].arguments["city"], json!("Oslo"));

    let requests = vendor.requests();
    assert_eq!(requests[0].path, "/v1beta/models/gemini-2.0-flash:generateContent");
    assert_eq!(requests[0].headers["x-goog-api-key"], "test-key");
}

#[tokio::test]
async fn slow_vendor_times_out() {
    let vendor = MockVendor::start([Reply::SlowJson(Duration::from_secs(5), json!({}))])
        .await
        .unwrap();
    let config = ConfigBuilder::new()
        .with_provider("gpt", "openai", &vendor.url("/v1"))
        .build();
    let transport = HttpTransport::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let registry = ProviderRegistry::from_config(&config.llm, Arc::new(transport)).unwrap();

    let err = registry
        .get("gpt")
        .unwrap()
        .generate(&request("gpt-4o-mini"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn configured_headers_reach_the_vendor() {
    let vendor = MockVendor::start([Reply::Json(json!({
        "choices": [{"message": {"role": "assistant", "content": "ok"}, "finish_reason": "stop"}]
    }))])
    .await
    .unwrap();
    let config = ConfigBuilder::new()
        .with_provider_extra("gpt", "openai", &vendor.url("/v1"), "headers = { x-team = \"core\" }")
        .build();

    provider(&config, "gpt").generate(&request("gpt-4o-mini")).await.unwrap();

    assert_eq!(vendor.requests()[0].headers["x-team"], "core");
}

#[tokio::test]
async fn unreadable_error_body_keeps_status() {
    let vendor = MockVendor::start([Reply::BrokenStatus(502)]).await.unwrap();
    let config = ConfigBuilder::new()
        .with_provider("gpt", "openai", &vendor.url("/v1"))
        .build();

    let err = provider(&config, "gpt").generate(&request("gpt-4o-mini")).await.unwrap_err();

    let LlmError::Transport { status, body } = &err else {
        panic!("expected transport error, got {err:?}");
    };
    assert_eq!(status.as_u16(), 502);
    assert!(body.is_empty());
    assert!(err.is_retryable());
}
