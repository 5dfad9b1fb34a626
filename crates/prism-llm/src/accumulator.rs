//! Reassembly of tool calls from streamed fragments

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::LlmError;
use crate::types::tool::arguments_from_value;
use crate::types::{ToolCall, ToolCallDelta};

#[derive(Debug, Default, Clone)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

/// Merges [`ToolCallDelta`]s by index into complete [`ToolCall`]s
///
/// Deltas for different indices may interleave freely. Id and name are
/// replaced whenever a delta provides them; argument fragments are appended.
#[derive(Debug, Default, Clone)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<u32, PartialCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fragment
    pub fn add(&mut self, delta: &ToolCallDelta) {
        let call = self.calls.entry(delta.index).or_default();

        if let Some(id) = &delta.id {
            call.id.clone_from(id);
        }
        if let Some(name) = &delta.name {
            call.name.clone_from(name);
        }
        if let Some(fragment) = &delta.arguments {
            call.arguments.push_str(fragment);
        }
    }

    /// Completed calls in ascending index order
    ///
    /// Empty arguments decode to an empty map, as does any JSON value that
    /// is not an object. Calling this twice yields equal results.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MalformedToolArguments` for the first call whose
    /// concatenated arguments are not valid JSON
    pub fn tool_calls(&self) -> Result<Vec<ToolCall>, LlmError> {
        self.calls
            .iter()
            .map(|(&index, call)| {
                let arguments = if call.arguments.trim().is_empty() {
                    serde_json::Map::new()
                } else {
                    let value: Value = serde_json::from_str(&call.arguments)
                        .map_err(|source| LlmError::MalformedToolArguments { index, source })?;
                    arguments_from_value(value)
                };

                Ok(ToolCall::new(call.id.clone(), call.name.clone(), arguments))
            })
            .collect()
    }

    /// Whether any fragment has been seen
    pub fn has_tool_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    /// Number of distinct indices seen
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Forget everything accumulated so far
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}
