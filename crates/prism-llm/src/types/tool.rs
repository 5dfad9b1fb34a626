use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Definition of a tool the model can call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the tool parameters
    #[serde(default)]
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Parameter schema as sent to vendors
    ///
    /// A missing or empty schema becomes `{"type": "object", "properties": {}}`,
    /// since vendors reject an absent one.
    pub fn parameters_schema(&self) -> Value {
        match &self.parameters {
            Value::Null => empty_object_schema(),
            Value::Object(map) if map.is_empty() => empty_object_schema(),
            other => other.clone(),
        }
    }
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// A complete tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// Decoded arguments
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Create a tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Arguments re-encoded as a JSON string (the `OpenAI` wire shape)
    pub fn arguments_json(&self) -> String {
        Value::Object(self.arguments.clone()).to_string()
    }
}

/// Decode a JSON value into an argument map
///
/// Non-object values carry no named arguments and decode to an empty map.
pub(crate) fn arguments_from_value(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// How the model should select tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides whether to call tools
    Auto,
    /// Model will not call any tools
    None,
    /// Model must call at least one tool
    Required,
    /// Model must call the named tool
    Tool(String),
}
