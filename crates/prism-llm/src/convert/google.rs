//! Conversion between canonical types and the Google Generative Language wire format

use std::collections::HashMap;

use serde_json::{Value, json};

use crate::error::LlmError;
use crate::protocol::google::{
    GoogleContent, GoogleFunctionCall, GoogleFunctionCallingConfig, GoogleFunctionDeclaration, GoogleFunctionResponse,
    GoogleGenerationConfig, GooglePart, GoogleRequest, GoogleResponse, GoogleStreamChunk, GoogleTool,
    GoogleToolConfig, GoogleUsageMetadata,
};
use crate::provider::{ChunkDecoder, DecodedChunk};
use crate::sse::SseFrame;
use crate::types::tool::arguments_from_value;
use crate::types::{
    FinishReason, GenerationRequest, GenerationResponse, Message, ResponseFormat, Role, StreamEvent, ToolCall,
    ToolCallDelta, ToolChoice, UsageInfo,
};

/// MIME type that switches Google into JSON output
const JSON_MIME_TYPE: &str = "application/json";

/// Google has no tool call ids; calls are numbered per response
fn synthesized_call_id(index: u32) -> String {
    format!("call_{index}")
}

// -- Outbound: canonical request -> Google wire request --

impl From<&GenerationRequest> for GoogleRequest {
    fn from(req: &GenerationRequest) -> Self {
        let (system, promoted) = req.resolved_system();

        let mut contents: Vec<GoogleContent> = Vec::with_capacity(req.messages().len());
        let mut call_names: HashMap<&str, &str> = HashMap::new();
        let mut open_responses = false;

        for (i, msg) in req.messages().iter().enumerate() {
            if Some(i) == promoted {
                continue;
            }

            if msg.role == Role::Tool {
                let part = function_response_part(msg, &call_names);

                // parallel function responses go back in one turn
                if open_responses && let Some(last) = contents.last_mut() {
                    last.parts.push(part);
                } else {
                    contents.push(GoogleContent {
                        role: Some("user".to_owned()),
                        parts: vec![part],
                    });
                }
                open_responses = true;
                continue;
            }

            open_responses = false;
            for call in &msg.tool_calls {
                call_names.insert(call.id.as_str(), call.name.as_str());
            }
            contents.push(message_to_google(msg));
        }

        let tools = (!req.tools().is_empty()).then(|| {
            vec![GoogleTool {
                function_declarations: req
                    .tools()
                    .iter()
                    .map(|t| GoogleFunctionDeclaration {
                        name: t.name.clone(),
                        description: (!t.description.is_empty()).then(|| t.description.clone()),
                        parameters: t.parameters_schema(),
                    })
                    .collect(),
            }]
        });

        let generation_config = generation_config(req);

        Self {
            contents,
            system_instruction: system.map(|text| GoogleContent {
                role: None,
                parts: vec![GooglePart::text(text)],
            }),
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
            tools,
            tool_config: req.tool_choice().map(tool_config),
        }
    }
}

/// Convert a non-tool canonical message
///
/// System messages that were not promoted are demoted to user turns.
fn message_to_google(msg: &Message) -> GoogleContent {
    let role = if msg.role == Role::Assistant { "model" } else { "user" };

    let mut parts = Vec::with_capacity(msg.tool_calls.len() + 1);
    if !msg.content.is_empty() || msg.tool_calls.is_empty() {
        parts.push(GooglePart::text(msg.content.clone()));
    }
    parts.extend(msg.tool_calls.iter().map(|tc| GooglePart {
        function_call: Some(GoogleFunctionCall {
            name: tc.name.clone(),
            args: Value::Object(tc.arguments.clone()),
        }),
        ..GooglePart::default()
    }));

    GoogleContent {
        role: Some(role.to_owned()),
        parts,
    }
}

/// Build a `functionResponse` part for a tool result
///
/// The function name comes from the assistant call with the same id, then
/// the message's own name, then the id itself. Non-object content is
/// wrapped as `{"result": ...}`.
fn function_response_part(msg: &Message, call_names: &HashMap<&str, &str>) -> GooglePart {
    let id = msg.tool_call_id.as_deref().unwrap_or_default();
    let name = call_names
        .get(id)
        .copied()
        .or(msg.name.as_deref())
        .unwrap_or(id);

    let response = match serde_json::from_str::<Value>(&msg.content) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(other) => json!({ "result": other }),
        Err(_) => json!({ "result": msg.content }),
    };

    GooglePart {
        function_response: Some(GoogleFunctionResponse {
            name: name.to_owned(),
            response,
        }),
        ..GooglePart::default()
    }
}

fn generation_config(req: &GenerationRequest) -> GoogleGenerationConfig {
    let (response_mime_type, response_schema) = match req.response_format() {
        Some(ResponseFormat::JsonObject) => (Some(JSON_MIME_TYPE.to_owned()), None),
        Some(ResponseFormat::JsonSchema { schema, .. }) => (Some(JSON_MIME_TYPE.to_owned()), Some(schema.clone())),
        Some(ResponseFormat::Text) | None => (None, None),
    };

    GoogleGenerationConfig {
        temperature: req.temperature(),
        top_p: req.top_p(),
        max_output_tokens: req.max_tokens(),
        stop_sequences: (!req.stop().is_empty()).then(|| req.stop().to_vec()),
        response_mime_type,
        response_schema,
    }
}

fn tool_config(choice: &ToolChoice) -> GoogleToolConfig {
    let (mode, allowed_function_names) = match choice {
        ToolChoice::Auto => ("AUTO", None),
        ToolChoice::None => ("NONE", None),
        ToolChoice::Required => ("ANY", None),
        ToolChoice::Tool(name) => ("ANY", Some(vec![name.clone()])),
    };

    GoogleToolConfig {
        function_calling_config: GoogleFunctionCallingConfig {
            mode: mode.to_owned(),
            allowed_function_names,
        },
    }
}

// -- Inbound: Google wire response -> canonical response --

impl From<&GoogleUsageMetadata> for UsageInfo {
    fn from(usage: &GoogleUsageMetadata) -> Self {
        Self::new(
            usage.prompt_token_count,
            usage.candidates_token_count,
            usage.total_token_count,
        )
    }
}

/// Google reports `STOP` even when the turn ends in function calls
fn canonical_finish_reason(reason: &str, has_tool_calls: bool) -> FinishReason {
    match FinishReason::from_vendor(reason) {
        FinishReason::Stop if has_tool_calls => FinishReason::ToolCalls,
        other => other,
    }
}

/// Build a canonical response from a decoded Google body
///
/// Only the first candidate is used. `model` is reported when the vendor
/// omits `modelVersion`.
///
/// # Errors
///
/// Returns `LlmError::Provider` if the body carries an error object
pub fn response_from_google(wire: GoogleResponse, model: &str, raw: Value) -> Result<GenerationResponse, LlmError> {
    if let Some(error) = wire.error {
        return Err(LlmError::Provider(format!("{}: {}", error.status, error.message)));
    }

    let usage = wire.usage_metadata.as_ref().map(UsageInfo::from);
    let model = wire.model_version.unwrap_or_else(|| model.to_owned());

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut reason = None;

    if let Some(candidate) = wire.candidates.into_iter().next() {
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if part.thought == Some(true) {
                continue;
            }
            if let Some(fragment) = part.text {
                text.push_str(&fragment);
            }
            if let Some(call) = part.function_call {
                let index = u32::try_from(tool_calls.len()).unwrap_or(u32::MAX);
                tool_calls.push(ToolCall::new(
                    synthesized_call_id(index),
                    call.name,
                    arguments_from_value(call.args),
                ));
            }
        }
        reason = candidate.finish_reason;
    }

    let finish_reason = reason.map(|r| canonical_finish_reason(&r, !tool_calls.is_empty()));

    Ok(GenerationResponse::assemble(text, tool_calls, model, usage, finish_reason, raw))
}

// -- Stream conversion --

/// Decoder state for one Google stream
///
/// Each frame is a complete response object; there is no end sentinel, so
/// the stream ends when the body does.
#[derive(Debug, Default)]
pub struct GoogleStreamState {
    next_tool_index: u32,
}

impl GoogleStreamState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkDecoder for GoogleStreamState {
    fn decode(&mut self, frame: &SseFrame, out: &mut DecodedChunk) -> Result<(), LlmError> {
        if frame.data.trim().is_empty() {
            return Ok(());
        }

        let chunk: GoogleStreamChunk = serde_json::from_str(&frame.data)
            .map_err(|e| LlmError::MalformedResponseBody(format!("invalid Google stream chunk: {e}")))?;

        if let Some(error) = chunk.error {
            return Err(LlmError::Provider(format!("{}: {}", error.status, error.message)));
        }

        if let Some(candidate) = chunk.candidates.into_iter().next() {
            for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
                if part.thought == Some(true) {
                    continue;
                }
                if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                    out.events.push(StreamEvent::TextDelta { text });
                }
                if let Some(call) = part.function_call {
                    let index = self.next_tool_index;
                    self.next_tool_index += 1;
                    out.events.push(StreamEvent::ToolCallDelta(ToolCallDelta {
                        index,
                        id: Some(synthesized_call_id(index)),
                        name: Some(call.name),
                        arguments: Some(call.args.to_string()),
                    }));
                }
            }

            if let Some(reason) = candidate.finish_reason {
                out.finish_reason = Some(canonical_finish_reason(&reason, self.next_tool_index > 0));
            }
        }

        out.usage = chunk.usage_metadata.as_ref().map(UsageInfo::from);

        Ok(())
    }
}
