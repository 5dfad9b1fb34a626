mod harness;

use std::time::Duration;

use harness::config::{ConfigBuilder, provider};
use harness::mock_vendor::{MockVendor, Reply};
use prism_llm::{
    EventStream, FinishReason, GenerationRequest, LlmError, Message, StreamContext, StreamEvent, UsageInfo,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

fn request(model: &str) -> GenerationRequest {
    GenerationRequest::builder(model)
        .message(Message::user("Hello"))
        .build()
        .unwrap()
}

/// Split an ASCII body into fixed-size chunks that ignore frame boundaries
fn chunked(body: &str, size: usize) -> Vec<String> {
    body.as_bytes()
        .chunks(size)
        .map(|chunk| String::from_utf8(chunk.to_vec()).unwrap())
        .collect()
}

fn anthropic_frame(event: &str, data: &Value) -> String {
    format!("event: {event}\ndata: {data}\n\n")
}

async fn collect(mut stream: EventStream) -> Vec<Result<StreamEvent, LlmError>> {
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn openai_text_stream_across_split_reads() {
    let body = concat!(
        ": keep-alive\r\n\r\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"Hel\"}}]}\r\n\r\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"},\"finish_reason\":\"stop\"}]}\r\n\r\n",
        "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":4,\"completion_tokens\":2,\"total_tokens\":6}}\r\n\r\n",
        "data: [DONE]\r\n\r\n",
    );
    let vendor = MockVendor::start([Reply::sse(chunked(body, 5))]).await.unwrap();
    let config = ConfigBuilder::new()
        .with_provider_extra("gpt", "openai", &vendor.url("/v1"), "include_stream_usage = true")
        .build();

    let stream = prism_llm::stream(provider(&config, "gpt").as_ref(), &request("gpt-4o-mini"), StreamContext::new())
        .await
        .unwrap();
    let events: Vec<StreamEvent> = collect(stream).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(
        events,
        vec![
            StreamEvent::text("Hel"),
            StreamEvent::text("lo"),
            StreamEvent::StreamCompleted {
                finish_reason: Some(FinishReason::Stop),
                usage: Some(UsageInfo::new(4, 2, Some(6))),
            },
        ]
    );

    let sent = &vendor.requests()[0];
    assert_eq!(sent.body["stream"], json!(true));
    assert_eq!(sent.body["stream_options"], json!({"include_usage": true}));
}

#[tokio::test]
async fn anthropic_tool_call_stream_over_http() {
    let body = [
        anthropic_frame(
            "message_start",
            &json!({"type": "message_start", "message": {"id": "msg_1", "model": "claude-sonnet-4", "usage": {"input_tokens": 15, "output_tokens": 1}}}),
        ),
        anthropic_frame("ping", &json!({"type": "ping"})),
        anthropic_frame(
            "content_block_start",
            &json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {}}}),
        ),
        anthropic_frame(
            "content_block_delta",
            &json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "{\"city\": \"Os"}}),
        ),
        anthropic_frame(
            "content_block_delta",
            &json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "lo\"}"}}),
        ),
        anthropic_frame("content_block_stop", &json!({"type": "content_block_stop", "index": 0})),
        anthropic_frame(
            "message_delta",
            &json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 30}}),
        ),
        anthropic_frame("message_stop", &json!({"type": "message_stop"})),
    ]
    .concat();
    let vendor = MockVendor::start([Reply::sse(chunked(&body, 11))]).await.unwrap();
    let config = ConfigBuilder::new()
        .with_provider("claude", "anthropic", &vendor.url("/v1"))
        .build();

    let stream = prism_llm::stream(
        provider(&config, "claude").as_ref(),
        &request("claude-sonnet-4"),
        StreamContext::new(),
    )
    .await
    .unwrap();
    let events: Vec<StreamEvent> = collect(stream).await.into_iter().map(Result::unwrap).collect();

    let (last, rest) = events.split_last().unwrap();
    assert_eq!(
        last,
        &StreamEvent::StreamCompleted {
            finish_reason: Some(FinishReason::ToolCalls),
            usage: Some(UsageInfo::new(15, 30, None)),
        }
    );
    let Some(StreamEvent::ToolCallsReady { tool_calls }) = rest.last() else {
        panic!("expected ToolCallsReady before completion, got {rest:?}");
    };
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0].id, "toolu_1");
    assert_eq!(tool_calls[0].name, "get_weather");
    assert_eq!(tool_calls[0].arguments["city"], json!("Oslo"));
}

#[tokio::test]
async fn google_stream_ends_at_eof() {
    let body = [
        json!({"candidates": [{"content": {"role": "model", "parts": [{"text": "Bon"}]}}]}),
        json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "jour"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5}
        }),
    ]
    .iter()
    .map(|chunk| format!("data: {chunk}\r\n\r\n"))
    .collect::<String>();
    let vendor = MockVendor::start([Reply::sse(chunked(&body, 16))]).await.unwrap();
    let config = ConfigBuilder::new()
        .with_provider("gemini", "google", &vendor.url("/v1beta"))
        .build();

    let stream = prism_llm::stream(
        provider(&config, "gemini").as_ref(),
        &request("gemini-2.0-flash"),
        StreamContext::new(),
    )
    .await
    .unwrap();
    let events: Vec<StreamEvent> = collect(stream).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(
        events,
        vec![
            StreamEvent::text("Bon"),
            StreamEvent::text("jour"),
            StreamEvent::StreamCompleted {
                finish_reason: Some(FinishReason::Stop),
                usage: Some(UsageInfo::new(3, 2, Some(5))),
            },
        ]
    );
    assert_eq!(
        vendor.requests()[0].path,
        "/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse"
    );
}

#[tokio::test]
async fn stream_rejected_before_any_event() {
    let vendor = MockVendor::start([Reply::Status(401, "bad key".to_owned())])
        .await
        .unwrap();
    let config = ConfigBuilder::new()
        .with_provider("gpt", "openai", &vendor.url("/v1"))
        .build();

    let result = prism_llm::stream(provider(&config, "gpt").as_ref(), &request("gpt-4o-mini"), StreamContext::new()).await;

    let Err(LlmError::Transport { status, body }) = result else {
        panic!("expected transport error");
    };
    assert_eq!(status.as_u16(), 401);
    assert_eq!(body, "bad key");
}

#[tokio::test]
async fn cancellation_stops_a_slow_stream() {
    let chunks = (0..10)
        .map(|i| format!("data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"t{i}\"}}}}]}}\n\n"))
        .collect();
    let vendor = MockVendor::start([Reply::Sse {
        chunks,
        delay: Duration::from_millis(50),
    }])
    .await
    .unwrap();
    let config = ConfigBuilder::new()
        .with_provider("gpt", "openai", &vendor.url("/v1"))
        .build();
    let cancel = CancellationToken::new();
    let context = StreamContext::new().with_cancellation_token(cancel.clone());

    let mut stream = prism_llm::stream(provider(&config, "gpt").as_ref(), &request("gpt-4o-mini"), context)
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap().unwrap(), StreamEvent::text("t0"));
    assert_eq!(stream.next().await.unwrap().unwrap(), StreamEvent::text("t1"));
    cancel.cancel();

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn configured_timeout_bounds_a_stalled_stream() {
    let vendor = MockVendor::start([Reply::Sse {
        chunks: vec!["data: {\"choices\":[]}\n\n".to_owned()],
        delay: Duration::from_secs(5),
    }])
    .await
    .unwrap();
    let config = ConfigBuilder::new()
        .with_provider_extra("gpt", "openai", &vendor.url("/v1"), "timeout = \"300ms\"")
        .build();

    let provider = provider(&config, "gpt");
    let err = match prism_llm::stream(provider.as_ref(), &request("gpt-4o-mini"), StreamContext::new()).await {
        Err(err) => err,
        Ok(mut stream) => match stream.next().await {
            Some(Err(err)) => err,
            other => panic!("expected a timeout error, got {other:?}"),
        },
    };

    assert!(matches!(err, LlmError::Network(_)), "got {err:?}");
}
