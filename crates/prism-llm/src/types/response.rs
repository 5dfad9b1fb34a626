use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::Message;
use super::tool::ToolCall;

/// Reason the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of generation or a stop sequence
    Stop,
    /// Hit the token limit
    Length,
    /// Model decided to call a tool
    ToolCalls,
    /// Content was filtered by safety systems
    ContentFilter,
    /// Vendor reason with no canonical equivalent
    Other(String),
}

impl FinishReason {
    /// Map a vendor stop reason string onto the canonical set
    ///
    /// Covers the `OpenAI`, Anthropic, and Google vocabularies.
    pub fn from_vendor(reason: &str) -> Self {
        match reason {
            "stop" | "end_turn" | "stop_sequence" | "STOP" => Self::Stop,
            "length" | "max_tokens" | "MAX_TOKENS" => Self::Length,
            "tool_calls" | "function_call" | "tool_use" => Self::ToolCalls,
            "content_filter" | "refusal" | "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
                Self::ContentFilter
            }
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInfo {
    /// Tokens consumed by the prompt
    pub input_tokens: u32,
    /// Tokens generated in the completion
    pub output_tokens: u32,
    /// Vendor-reported total, or the sum when the vendor omits it
    pub total_tokens: u32,
}

impl UsageInfo {
    /// Build usage, defaulting the total to `input + output`
    pub const fn new(input_tokens: u32, output_tokens: u32, total_tokens: Option<u32>) -> Self {
        let total_tokens = match total_tokens {
            Some(total) => total,
            None => input_tokens.saturating_add(output_tokens),
        };
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Canonical generation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Concatenated assistant text, if any was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Messages produced by the turn (normally one assistant message)
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Tool calls requested by the model
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Model that produced the response
    pub model: String,
    /// Token usage, when the vendor reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageInfo>,
    /// Why generation stopped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Untouched vendor payload, kept for diagnostics
    #[serde(default)]
    pub raw: Value,
}

impl GenerationResponse {
    /// Assemble a response from its parsed parts
    ///
    /// Synthesizes one assistant message carrying the text and tool calls,
    /// or none when the turn produced neither.
    pub fn assemble(
        text: String,
        tool_calls: Vec<ToolCall>,
        model: String,
        usage: Option<UsageInfo>,
        finish_reason: Option<FinishReason>,
        raw: Value,
    ) -> Self {
        let text = (!text.is_empty()).then_some(text);

        let messages = if text.is_none() && tool_calls.is_empty() {
            Vec::new()
        } else {
            vec![Message::assistant_with_tool_calls(
                text.clone().unwrap_or_default(),
                tool_calls.clone(),
            )]
        };

        Self {
            text,
            messages,
            tool_calls,
            model,
            usage,
            finish_reason,
            raw,
        }
    }
}
