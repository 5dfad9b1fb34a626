//! Conversion between canonical types and the Anthropic wire format

use std::collections::HashMap;

use serde_json::Value;

use crate::error::LlmError;
use crate::protocol::anthropic::{
    AnthropicContent, AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse,
    AnthropicResponseBlock, AnthropicStreamContentBlock, AnthropicStreamDelta, AnthropicStreamEvent, AnthropicTool,
    AnthropicToolChoice, AnthropicUsage,
};
use crate::provider::{ChunkDecoder, DecodedChunk};
use crate::sse::SseFrame;
use crate::types::tool::arguments_from_value;
use crate::types::{
    FinishReason, GenerationRequest, GenerationResponse, Message, Role, StreamEvent, ToolCall, ToolCallDelta,
    ToolChoice, ToolDefinition, UsageInfo,
};

// -- Outbound: canonical request -> Anthropic wire request --

/// Build the wire request
///
/// `default_max_tokens` fills the required `max_tokens` field when the
/// request leaves it unset.
pub fn to_anthropic_request(req: &GenerationRequest, default_max_tokens: u32) -> AnthropicRequest {
    let (system, promoted) = req.resolved_system();

    let mut messages: Vec<AnthropicMessage> = Vec::with_capacity(req.messages().len());
    let mut open_tool_results = false;

    for (i, msg) in req.messages().iter().enumerate() {
        if Some(i) == promoted {
            continue;
        }

        if msg.role == Role::Tool {
            let block = AnthropicContentBlock::ToolResult {
                tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                content: Some(msg.content.clone()),
            };

            // consecutive tool results share one user turn
            if open_tool_results
                && let Some(AnthropicMessage {
                    content: AnthropicContent::Blocks(blocks),
                    ..
                }) = messages.last_mut()
            {
                blocks.push(block);
            } else {
                messages.push(AnthropicMessage {
                    role: "user".to_owned(),
                    content: AnthropicContent::Blocks(vec![block]),
                });
            }
            open_tool_results = true;
            continue;
        }

        open_tool_results = false;
        messages.push(message_to_anthropic(msg));
    }

    let tools = (!req.tools().is_empty()).then(|| req.tools().iter().map(Into::into).collect());
    let stop_sequences = (!req.stop().is_empty()).then(|| req.stop().to_vec());

    if req.response_format().is_some() {
        tracing::debug!("anthropic has no JSON mode, ignoring response format");
    }

    AnthropicRequest {
        model: req.model().to_owned(),
        max_tokens: req.max_tokens().unwrap_or(default_max_tokens),
        system: system.map(str::to_owned),
        messages,
        temperature: req.temperature(),
        top_p: req.top_p(),
        stop_sequences,
        stream: None,
        tools,
        tool_choice: req.tool_choice().map(Into::into),
    }
}

/// Convert a non-tool canonical message
///
/// System messages that were not promoted are demoted to user turns.
fn message_to_anthropic(msg: &Message) -> AnthropicMessage {
    let role = match msg.role {
        Role::Assistant => "assistant",
        Role::System | Role::User | Role::Tool => "user",
    };

    if msg.tool_calls.is_empty() {
        return AnthropicMessage {
            role: role.to_owned(),
            content: AnthropicContent::Text(msg.content.clone()),
        };
    }

    let mut blocks = Vec::with_capacity(msg.tool_calls.len() + 1);
    if !msg.content.is_empty() {
        blocks.push(AnthropicContentBlock::Text {
            text: msg.content.clone(),
        });
    }
    blocks.extend(msg.tool_calls.iter().map(|tc| AnthropicContentBlock::ToolUse {
        id: tc.id.clone(),
        name: tc.name.clone(),
        input: Value::Object(tc.arguments.clone()),
    }));

    AnthropicMessage {
        role: role.to_owned(),
        content: AnthropicContent::Blocks(blocks),
    }
}

impl From<&ToolDefinition> for AnthropicTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            name: tool.name.clone(),
            description: (!tool.description.is_empty()).then(|| tool.description.clone()),
            input_schema: tool.parameters_schema(),
        }
    }
}

impl From<&ToolChoice> for AnthropicToolChoice {
    fn from(choice: &ToolChoice) -> Self {
        let (choice_type, name) = match choice {
            ToolChoice::Auto => ("auto", None),
            ToolChoice::None => ("none", None),
            ToolChoice::Required => ("any", None),
            ToolChoice::Tool(name) => ("tool", Some(name.clone())),
        };
        Self {
            choice_type: choice_type.to_owned(),
            name,
        }
    }
}

// -- Inbound: Anthropic wire response -> canonical response --

impl From<&AnthropicUsage> for UsageInfo {
    fn from(usage: &AnthropicUsage) -> Self {
        Self::new(usage.input_tokens, usage.output_tokens, None)
    }
}

/// Build a canonical response from a decoded Anthropic body
pub fn response_from_anthropic(wire: AnthropicResponse, raw: Value) -> GenerationResponse {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for block in wire.content {
        match block {
            AnthropicResponseBlock::Text { text: fragment } => text.push_str(&fragment),
            AnthropicResponseBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCall::new(id, name, arguments_from_value(input)));
            }
            AnthropicResponseBlock::Unknown => {}
        }
    }

    GenerationResponse::assemble(
        text,
        tool_calls,
        wire.model,
        wire.usage.as_ref().map(UsageInfo::from),
        wire.stop_reason.as_deref().map(FinishReason::from_vendor),
        raw,
    )
}

// -- Stream conversion --

/// Decoder state for one Anthropic stream
///
/// Anthropic's content block index is shared across all block types, so a
/// tool use following a text block has block index 1 or more. Tool calls are
/// renumbered sequentially from 0.
#[derive(Debug, Default)]
pub struct AnthropicStreamState {
    tool_indices: HashMap<u32, u32>,
    input_tokens: u32,
    output_tokens: u32,
    saw_usage: bool,
}

impl AnthropicStreamState {
    /// Create a new stream state tracker
    pub fn new() -> Self {
        Self::default()
    }

    fn record_usage(&mut self, usage: &AnthropicUsage, out: &mut DecodedChunk) {
        if usage.input_tokens > 0 {
            self.input_tokens = usage.input_tokens;
        }
        self.output_tokens = usage.output_tokens;
        self.saw_usage = true;
        out.usage = Some(UsageInfo::new(self.input_tokens, self.output_tokens, None));
    }
}

impl ChunkDecoder for AnthropicStreamState {
    fn decode(&mut self, frame: &SseFrame, out: &mut DecodedChunk) -> Result<(), LlmError> {
        if frame.data.trim().is_empty() {
            return Ok(());
        }

        let event: AnthropicStreamEvent = serde_json::from_str(&frame.data)
            .map_err(|e| LlmError::MalformedResponseBody(format!("invalid Anthropic stream event: {e}")))?;

        match event {
            AnthropicStreamEvent::MessageStart { message } => {
                if let Some(usage) = &message.usage {
                    self.record_usage(usage, out);
                }
            }

            AnthropicStreamEvent::ContentBlockStart { index, content_block } => {
                if let AnthropicStreamContentBlock::ToolUse { id, name } = content_block {
                    let tool_index = u32::try_from(self.tool_indices.len()).unwrap_or(u32::MAX);
                    self.tool_indices.insert(index, tool_index);
                    out.events
                        .push(StreamEvent::ToolCallDelta(ToolCallDelta::start(tool_index, id, name)));
                }
            }

            AnthropicStreamEvent::ContentBlockDelta { index, delta } => match delta {
                AnthropicStreamDelta::TextDelta { text } if !text.is_empty() => {
                    out.events.push(StreamEvent::TextDelta { text });
                }
                AnthropicStreamDelta::InputJsonDelta { partial_json } => {
                    let Some(&tool_index) = self.tool_indices.get(&index) else {
                        tracing::debug!(block = index, "input delta for unknown tool block");
                        return Ok(());
                    };
                    out.events.push(StreamEvent::ToolCallDelta(ToolCallDelta::arguments(
                        tool_index,
                        partial_json,
                    )));
                }
                AnthropicStreamDelta::TextDelta { .. } | AnthropicStreamDelta::Unknown => {}
            },

            AnthropicStreamEvent::MessageDelta { delta, usage } => {
                if let Some(reason) = delta.stop_reason {
                    out.finish_reason = Some(FinishReason::from_vendor(&reason));
                }
                if let Some(usage) = &usage {
                    self.record_usage(usage, out);
                }
            }

            AnthropicStreamEvent::MessageStop => out.done = true,

            AnthropicStreamEvent::Error { error } => {
                return Err(LlmError::Provider(format!("{}: {}", error.error_type, error.message)));
            }

            AnthropicStreamEvent::ContentBlockStop { .. }
            | AnthropicStreamEvent::Ping
            | AnthropicStreamEvent::Unknown => {
                tracing::trace!(event = frame.event_type(), "ignoring anthropic stream event");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(state: &mut AnthropicStreamState, data: Value) -> Result<DecodedChunk, LlmError> {
        let mut out = DecodedChunk::default();
        state.decode(&SseFrame::data(data.to_string()), &mut out)?;
        Ok(out)
    }

    #[test]
    fn system_is_top_level_and_extras_demoted() {
        let request = GenerationRequest::builder("claude-sonnet-4")
            .message(Message::system("be terse"))
            .message(Message::user("hi"))
            .message(Message::system("also polite"))
            .build()
            .unwrap();

        let wire = serde_json::to_value(to_anthropic_request(&request, 4096)).unwrap();
        assert_eq!(
            wire,
            json!({
                "model": "claude-sonnet-4",
                "max_tokens": 4096,
                "system": "be terse",
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "user", "content": "also polite"},
                ]
            })
        );
    }

    #[test]
    fn explicit_max_tokens_wins_over_default() {
        let request = GenerationRequest::builder("claude")
            .message(Message::user("hi"))
            .max_tokens(64)
            .build()
            .unwrap();
        assert_eq!(to_anthropic_request(&request, 4096).max_tokens, 64);
    }

    #[test]
    fn consecutive_tool_results_share_a_user_turn() {
        let first = ToolCall::new("t1", "a", serde_json::Map::new());
        let second = ToolCall::new("t2", "b", json!({"x": 1}).as_object().unwrap().clone());
        let request = GenerationRequest::builder("claude")
            .message(Message::user("go"))
            .message(Message::assistant_with_tool_calls("calling", vec![first, second]))
            .message(Message::tool("t1", "one"))
            .message(Message::tool("t2", "two"))
            .message(Message::user("thanks"))
            .build()
            .unwrap();

        let wire = serde_json::to_value(to_anthropic_request(&request, 4096)).unwrap();
        assert_eq!(
            wire["messages"],
            json!([
                {"role": "user", "content": "go"},
                {"role": "assistant", "content": [
                    {"type": "text", "text": "calling"},
                    {"type": "tool_use", "id": "t1", "name": "a", "input": {}},
                    {"type": "tool_use", "id": "t2", "name": "b", "input": {"x": 1}},
                ]},
                {"role": "user", "content": [
                    {"type": "tool_result", "tool_use_id": "t1", "content": "one"},
                    {"type": "tool_result", "tool_use_id": "t2", "content": "two"},
                ]},
                {"role": "user", "content": "thanks"},
            ])
        );
    }

    #[test]
    fn tools_and_choice_render() {
        let request = GenerationRequest::builder("claude")
            .message(Message::user("hi"))
            .tool(ToolDefinition::new("ping", "", json!({})))
            .tool_choice(ToolChoice::Required)
            .build()
            .unwrap();

        let wire = serde_json::to_value(to_anthropic_request(&request, 4096)).unwrap();
        assert_eq!(
            wire["tools"],
            json!([{"name": "ping", "input_schema": {"type": "object", "properties": {}}}])
        );
        assert_eq!(wire["tool_choice"], json!({"type": "any"}));
    }

    #[test]
    fn response_blocks_are_flattened() {
        let raw = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude",
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "tu_1", "name": "lookup", "input": {"q": "rust"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 8}
        });
        let wire: AnthropicResponse = serde_json::from_value(raw.clone()).unwrap();
        let response = response_from_anthropic(wire, raw);

        assert_eq!(response.text.as_deref(), Some("Let me check."));
        assert_eq!(response.tool_calls[0].arguments["q"], json!("rust"));
        assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(response.usage, Some(UsageInfo::new(12, 8, Some(20))));
    }

    #[test]
    fn tool_index_is_sequential_across_blocks() {
        let mut state = AnthropicStreamState::new();

        decode(&mut state, json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}})).unwrap();
        let start = decode(
            &mut state,
            json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "tu_1", "name": "f", "input": {}}}),
        )
        .unwrap();
        let delta = decode(
            &mut state,
            json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"a\""}}),
        )
        .unwrap();

        assert_eq!(start.events, vec![StreamEvent::ToolCallDelta(ToolCallDelta::start(0, "tu_1", "f"))]);
        assert_eq!(delta.events, vec![StreamEvent::ToolCallDelta(ToolCallDelta::arguments(0, "{\"a\""))]);
    }

    #[test]
    fn usage_combines_start_and_delta() {
        let mut state = AnthropicStreamState::new();

        decode(
            &mut state,
            json!({"type": "message_start", "message": {"id": "m", "model": "claude", "usage": {"input_tokens": 25, "output_tokens": 1}}}),
        )
        .unwrap();
        let end = decode(
            &mut state,
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": 15}}),
        )
        .unwrap();

        assert_eq!(end.finish_reason, Some(FinishReason::Stop));
        assert_eq!(end.usage, Some(UsageInfo::new(25, 15, None)));
    }

    #[test]
    fn stop_error_and_unknown_events() {
        let mut state = AnthropicStreamState::new();

        assert!(decode(&mut state, json!({"type": "message_stop"})).unwrap().done);
        assert!(decode(&mut state, json!({"type": "ping"})).unwrap().events.is_empty());
        assert!(decode(&mut state, json!({"type": "brand_new_event"})).unwrap().events.is_empty());
        assert!(matches!(
            decode(&mut state, json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}})),
            Err(LlmError::Provider(message)) if message == "overloaded_error: Overloaded"
        ));
    }
}
