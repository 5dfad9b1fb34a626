//! Conversion between canonical types and the `OpenAI` wire format

use serde_json::Value;

use crate::error::LlmError;
use crate::protocol::openai::{
    OpenAiFunction, OpenAiFunctionCall, OpenAiJsonSchema, OpenAiMessage, OpenAiRequest, OpenAiResponse,
    OpenAiResponseFormat, OpenAiStreamChunk, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
use crate::provider::{ChunkDecoder, DecodedChunk};
use crate::sse::SseFrame;
use crate::types::tool::arguments_from_value;
use crate::types::{
    FinishReason, GenerationRequest, GenerationResponse, Message, ResponseFormat, Role, StreamEvent, ToolCall,
    ToolCallDelta, ToolChoice, ToolDefinition, UsageInfo,
};

/// Terminal sentinel of an `OpenAI` stream
const DONE_SENTINEL: &str = "[DONE]";

// -- Outbound: canonical request -> OpenAI wire request --

impl From<&GenerationRequest> for OpenAiRequest {
    fn from(req: &GenerationRequest) -> Self {
        let (system, promoted) = req.resolved_system();

        let mut messages = Vec::with_capacity(req.messages().len() + 1);
        if let Some(system) = system {
            messages.push(OpenAiMessage {
                role: "system".to_owned(),
                content: Some(system.to_owned()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            });
        }
        messages.extend(
            req.messages()
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != promoted)
                .map(|(_, m)| OpenAiMessage::from(m)),
        );

        let tools = (!req.tools().is_empty()).then(|| req.tools().iter().map(Into::into).collect());
        let stop = (!req.stop().is_empty()).then(|| req.stop().to_vec());

        Self {
            model: req.model().to_owned(),
            messages,
            temperature: req.temperature(),
            top_p: req.top_p(),
            max_tokens: req.max_tokens(),
            stop,
            stream: None,
            tools,
            tool_choice: req.tool_choice().map(tool_choice_to_openai_value),
            response_format: req.response_format().map(Into::into),
            stream_options: None,
        }
    }
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };

        let tool_calls = (!msg.tool_calls.is_empty()).then(|| {
            msg.tool_calls
                .iter()
                .map(|tc| OpenAiToolCall {
                    id: tc.id.clone(),
                    tool_type: "function".to_owned(),
                    function: OpenAiFunctionCall {
                        name: tc.name.clone(),
                        arguments: tc.arguments_json(),
                    },
                })
                .collect::<Vec<_>>()
        });

        // assistant turns that only call tools carry null content
        let content = if msg.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(msg.content.clone())
        };

        Self {
            role: role.to_owned(),
            content,
            name: msg.name.clone(),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

impl From<&ToolDefinition> for OpenAiTool {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            tool_type: "function".to_owned(),
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: (!tool.description.is_empty()).then(|| tool.description.clone()),
                parameters: tool.parameters_schema(),
            },
        }
    }
}

impl From<&ResponseFormat> for OpenAiResponseFormat {
    fn from(format: &ResponseFormat) -> Self {
        match format {
            ResponseFormat::Text => Self::Text,
            ResponseFormat::JsonObject => Self::JsonObject,
            ResponseFormat::JsonSchema { name, schema } => Self::JsonSchema {
                json_schema: OpenAiJsonSchema {
                    name: name.clone(),
                    schema: schema.clone(),
                },
            },
        }
    }
}

/// Convert canonical tool choice to the `OpenAI` JSON value
fn tool_choice_to_openai_value(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => Value::String("auto".to_owned()),
        ToolChoice::None => Value::String("none".to_owned()),
        ToolChoice::Required => Value::String("required".to_owned()),
        ToolChoice::Tool(name) => serde_json::json!({
            "type": "function",
            "function": { "name": name }
        }),
    }
}

// -- Inbound: OpenAI wire response -> canonical response --

impl From<&OpenAiUsage> for UsageInfo {
    fn from(usage: &OpenAiUsage) -> Self {
        Self::new(usage.prompt_tokens, usage.completion_tokens, usage.total_tokens)
    }
}

/// Build a canonical response from a decoded `OpenAI` body
///
/// Only the first choice is used.
///
/// # Errors
///
/// Returns `LlmError::MalformedToolArguments` if a tool call's arguments
/// string is not JSON
pub fn response_from_openai(wire: OpenAiResponse, raw: Value) -> Result<GenerationResponse, LlmError> {
    let usage = wire.usage.as_ref().map(UsageInfo::from);

    let Some(choice) = wire.choices.into_iter().next() else {
        return Ok(GenerationResponse::assemble(
            String::new(),
            Vec::new(),
            wire.model,
            usage,
            None,
            raw,
        ));
    };

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .zip(0u32..)
        .map(|(tc, index)| {
            let arguments = if tc.function.arguments.trim().is_empty() {
                serde_json::Map::new()
            } else {
                let value = serde_json::from_str(&tc.function.arguments)
                    .map_err(|source| LlmError::MalformedToolArguments { index, source })?;
                arguments_from_value(value)
            };
            Ok(ToolCall::new(tc.id, tc.function.name, arguments))
        })
        .collect::<Result<Vec<_>, LlmError>>()?;

    Ok(GenerationResponse::assemble(
        choice.message.content.unwrap_or_default(),
        tool_calls,
        wire.model,
        usage,
        choice.finish_reason.as_deref().map(FinishReason::from_vendor),
        raw,
    ))
}

// -- Stream conversion --

/// Decodes `chat.completion.chunk` frames
#[derive(Debug, Default)]
pub struct OpenAiStreamDecoder;

impl ChunkDecoder for OpenAiStreamDecoder {
    fn decode(&mut self, frame: &SseFrame, out: &mut DecodedChunk) -> Result<(), LlmError> {
        let data = frame.data.trim();
        if data == DONE_SENTINEL {
            out.done = true;
            return Ok(());
        }
        if data.is_empty() {
            return Ok(());
        }

        let chunk: OpenAiStreamChunk = serde_json::from_str(data)
            .map_err(|e| LlmError::MalformedResponseBody(format!("invalid OpenAI stream chunk: {e}")))?;

        if let Some(error) = chunk.error {
            return Err(LlmError::Provider(error.message));
        }

        for choice in chunk.choices {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                out.events.push(StreamEvent::TextDelta { text });
            }

            for call in choice.delta.tool_calls.into_iter().flatten() {
                let (name, arguments) = call
                    .function
                    .map_or((None, None), |f| (f.name, f.arguments));
                out.events.push(StreamEvent::ToolCallDelta(ToolCallDelta {
                    index: call.index,
                    id: call.id,
                    name,
                    arguments,
                }));
            }

            if let Some(reason) = choice.finish_reason {
                out.finish_reason = Some(FinishReason::from_vendor(&reason));
            }
        }

        out.usage = chunk.usage.as_ref().map(UsageInfo::from);

        Ok(())
    }
}
