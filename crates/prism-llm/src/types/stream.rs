use serde::{Deserialize, Serialize};

use super::response::{FinishReason, UsageInfo};
use super::tool::ToolCall;

/// Event emitted while streaming a response
///
/// Within one call the order is significant: any number of text and tool
/// call deltas, then at most one `ToolCallsReady`, then `StreamCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental assistant text
    TextDelta {
        /// Text fragment
        text: String,
    },
    /// Partial tool call data
    ToolCallDelta(ToolCallDelta),
    /// All tool calls of the turn, fully assembled
    ToolCallsReady {
        /// Completed calls in index order
        tool_calls: Vec<ToolCall>,
    },
    /// Stream finished normally
    StreamCompleted {
        /// Why generation stopped
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finish_reason: Option<FinishReason>,
        /// Final token usage
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<UsageInfo>,
    },
}

impl StreamEvent {
    /// Text delta event
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }
}

/// Fragment of a tool call, keyed by its per-response index
///
/// Any field may be absent. Id and name overwrite once known; argument
/// fragments concatenate in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Position of the call within the response
    pub index: u32,
    /// Tool call ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tool name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Raw JSON fragment of the arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl ToolCallDelta {
    /// Delta announcing a call's identity
    pub fn start(index: u32, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            id: Some(id.into()),
            name: Some(name.into()),
            arguments: None,
        }
    }

    /// Delta carrying an arguments fragment
    pub fn arguments(index: u32, fragment: impl Into<String>) -> Self {
        Self {
            index,
            arguments: Some(fragment.into()),
            ..Self::default()
        }
    }
}
