use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::{Message, Role};
use super::tool::{ToolChoice, ToolDefinition};
use crate::error::LlmError;

/// Output format hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text
    Text,
    /// Any syntactically valid JSON object
    JsonObject,
    /// JSON conforming to a named schema
    JsonSchema {
        /// Schema name
        name: String,
        /// JSON Schema document
        schema: Value,
    },
}

/// Canonical generation request
///
/// Immutable once built: read through accessors, derive variants with
/// [`GenerationRequest::with`]. Deserialization applies the same checks as
/// [`GenerationRequestBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGenerationRequest")]
pub struct GenerationRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, Value>,
}

impl GenerationRequest {
    /// Start building a request for `model`
    pub fn builder(model: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            inner: Self {
                model: model.into(),
                messages: Vec::new(),
                system_prompt: None,
                temperature: None,
                max_tokens: None,
                top_p: None,
                stop: Vec::new(),
                tools: Vec::new(),
                tool_choice: None,
                response_format: None,
                metadata: BTreeMap::new(),
            },
        }
    }

    /// Model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Conversation history
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Explicit system prompt
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Sampling temperature
    pub const fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Maximum tokens to generate
    pub const fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Nucleus sampling threshold
    pub const fn top_p(&self) -> Option<f64> {
        self.top_p
    }

    /// Stop sequences
    pub fn stop(&self) -> &[String] {
        &self.stop
    }

    /// Tools offered to the model
    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Tool selection policy
    pub const fn tool_choice(&self) -> Option<&ToolChoice> {
        self.tool_choice.as_ref()
    }

    /// Output format hint
    pub const fn response_format(&self) -> Option<&ResponseFormat> {
        self.response_format.as_ref()
    }

    /// Opaque caller metadata, never sent to vendors
    pub const fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// The system prompt a vendor should receive, and the index of the
    /// history message it was promoted from
    ///
    /// An explicit system prompt wins; otherwise the first system-role
    /// message is promoted.
    pub fn resolved_system(&self) -> (Option<&str>, Option<usize>) {
        if let Some(prompt) = &self.system_prompt {
            return (Some(prompt), None);
        }

        self.messages
            .iter()
            .position(|m| m.role == Role::System)
            .map_or((None, None), |i| (Some(self.messages[i].content.as_str()), Some(i)))
    }

    /// Produce a modified copy
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidRequest` if replacement messages violate a
    /// message invariant
    pub fn with(&self, overrides: RequestOverrides) -> Result<Self, LlmError> {
        let mut next = self.clone();
        let RequestOverrides {
            model,
            messages,
            system_prompt,
            temperature,
            max_tokens,
            top_p,
            stop,
            tools,
            tool_choice,
            response_format,
            metadata,
        } = overrides;

        if let Some(model) = model {
            next.model = model;
        }
        if let Some(messages) = messages {
            validate_messages(&messages)?;
            next.messages = messages;
        }
        if let Some(system_prompt) = system_prompt {
            next.system_prompt = system_prompt;
        }
        if let Some(temperature) = temperature {
            next.temperature = temperature;
        }
        if let Some(max_tokens) = max_tokens {
            next.max_tokens = max_tokens;
        }
        if let Some(top_p) = top_p {
            next.top_p = top_p;
        }
        if let Some(stop) = stop {
            next.stop = stop;
        }
        if let Some(tools) = tools {
            next.tools = tools;
        }
        if let Some(tool_choice) = tool_choice {
            next.tool_choice = tool_choice;
        }
        if let Some(response_format) = response_format {
            next.response_format = response_format;
        }
        if let Some(metadata) = metadata {
            next.metadata.extend(metadata);
        }

        Ok(next)
    }
}

fn validate_messages(messages: &[Message]) -> Result<(), LlmError> {
    messages.iter().try_for_each(Message::validate)
}

/// Unchecked wire shape of [`GenerationRequest`]
#[derive(Deserialize)]
struct RawGenerationRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(default)]
    system_prompt: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    top_p: Option<f64>,
    #[serde(default)]
    stop: Vec<String>,
    #[serde(default)]
    tools: Vec<ToolDefinition>,
    #[serde(default)]
    tool_choice: Option<ToolChoice>,
    #[serde(default)]
    response_format: Option<ResponseFormat>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

impl TryFrom<RawGenerationRequest> for GenerationRequest {
    type Error = LlmError;

    fn try_from(raw: RawGenerationRequest) -> Result<Self, Self::Error> {
        GenerationRequestBuilder {
            inner: Self {
                model: raw.model,
                messages: raw.messages,
                system_prompt: raw.system_prompt,
                temperature: raw.temperature,
                max_tokens: raw.max_tokens,
                top_p: raw.top_p,
                stop: raw.stop,
                tools: raw.tools,
                tool_choice: raw.tool_choice,
                response_format: raw.response_format,
                metadata: raw.metadata,
            },
        }
        .build()
    }
}

/// Field replacements for [`GenerationRequest::with`]
///
/// `None` keeps the original value. Optional settings take
/// `Some(None)` to clear them and `Some(Some(v))` to replace them. Metadata
/// entries are merged into the existing map rather than replacing it.
#[derive(Debug, Clone, Default)]
#[allow(clippy::option_option)]
pub struct RequestOverrides {
    /// Replacement model
    pub model: Option<String>,
    /// Replacement history
    pub messages: Option<Vec<Message>>,
    /// Replacement or cleared system prompt
    pub system_prompt: Option<Option<String>>,
    /// Replacement or cleared temperature
    pub temperature: Option<Option<f64>>,
    /// Replacement or cleared token limit
    pub max_tokens: Option<Option<u32>>,
    /// Replacement or cleared top-p
    pub top_p: Option<Option<f64>>,
    /// Replacement stop sequences
    pub stop: Option<Vec<String>>,
    /// Replacement tool list
    pub tools: Option<Vec<ToolDefinition>>,
    /// Replacement or cleared tool choice
    pub tool_choice: Option<Option<ToolChoice>>,
    /// Replacement or cleared response format
    pub response_format: Option<Option<ResponseFormat>>,
    /// Metadata entries to add or replace
    pub metadata: Option<BTreeMap<String, Value>>,
}

/// Builder for [`GenerationRequest`]
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    inner: GenerationRequest,
}

impl GenerationRequestBuilder {
    /// Append a message
    #[must_use]
    pub fn message(mut self, message: Message) -> Self {
        self.inner.messages.push(message);
        self
    }

    /// Append several messages
    #[must_use]
    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.inner.messages.extend(messages);
        self
    }

    /// Set the system prompt
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.inner.system_prompt = Some(prompt.into());
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn temperature(mut self, temperature: f64) -> Self {
        self.inner.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens to generate
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.inner.max_tokens = Some(max_tokens);
        self
    }

    /// Set the nucleus sampling threshold
    #[must_use]
    pub const fn top_p(mut self, top_p: f64) -> Self {
        self.inner.top_p = Some(top_p);
        self
    }

    /// Add a stop sequence
    #[must_use]
    pub fn stop(mut self, sequence: impl Into<String>) -> Self {
        self.inner.stop.push(sequence.into());
        self
    }

    /// Offer a tool to the model
    #[must_use]
    pub fn tool(mut self, tool: ToolDefinition) -> Self {
        self.inner.tools.push(tool);
        self
    }

    /// Set the tool selection policy
    #[must_use]
    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.inner.tool_choice = Some(choice);
        self
    }

    /// Set the output format hint
    #[must_use]
    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.inner.response_format = Some(format);
        self
    }

    /// Attach caller metadata
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inner.metadata.insert(key.into(), value);
        self
    }

    /// Validate and finish the request
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidRequest` if the model is empty or a message
    /// violates its role invariants
    pub fn build(self) -> Result<GenerationRequest, LlmError> {
        if self.inner.model.trim().is_empty() {
            return Err(LlmError::InvalidRequest("model must not be empty".to_owned()));
        }
        validate_messages(&self.inner.messages)?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn base() -> GenerationRequest {
        GenerationRequest::builder("gpt-4o")
            .message(Message::system("be terse"))
            .message(Message::user("hi"))
            .temperature(0.2)
            .metadata("trace", json!("abc"))
            .build()
            .unwrap()
    }

    #[test]
    fn with_returns_modified_copy() {
        let original = base();
        let changed = original
            .with(RequestOverrides {
                model: Some("gpt-4o-mini".to_owned()),
                max_tokens: Some(Some(64)),
                ..RequestOverrides::default()
            })
            .unwrap();

        assert_eq!(original.model(), "gpt-4o");
        assert_eq!(original.max_tokens(), None);
        assert_eq!(changed.model(), "gpt-4o-mini");
        assert_eq!(changed.max_tokens(), Some(64));
        assert_eq!(changed.temperature(), Some(0.2));
        assert_eq!(changed.messages(), original.messages());
    }

    #[test]
    fn with_merges_metadata() {
        let changed = base()
            .with(RequestOverrides {
                metadata: Some(BTreeMap::from([("user".to_owned(), json!(7))])),
                ..RequestOverrides::default()
            })
            .unwrap();

        assert_eq!(changed.metadata().len(), 2);
        assert_eq!(changed.metadata()["trace"], json!("abc"));
    }

    #[test]
    fn with_rejects_invalid_messages() {
        let mut orphan = Message::tool("x", "result");
        orphan.tool_call_id = None;

        let result = base().with(RequestOverrides {
            messages: Some(vec![orphan]),
            ..RequestOverrides::default()
        });
        assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
    }

    #[test]
    fn with_clears_optional_settings() {
        let original = base();
        let changed = original
            .with(RequestOverrides {
                temperature: Some(None),
                system_prompt: Some(Some("override".to_owned())),
                ..RequestOverrides::default()
            })
            .unwrap();

        assert_eq!(original.temperature(), Some(0.2));
        assert_eq!(changed.temperature(), None);
        assert_eq!(changed.system_prompt(), Some("override"));
    }

    #[test]
    fn deserialize_rejects_tool_message_without_id() {
        let result = serde_json::from_value::<GenerationRequest>(json!({
            "model": "m",
            "messages": [{"role": "tool", "content": "x"}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_accepts_valid_request() {
        let original = base();
        let decoded: GenerationRequest = serde_json::from_value(serde_json::to_value(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn build_rejects_empty_model() {
        assert!(GenerationRequest::builder(" ").build().is_err());
    }

    #[test]
    fn first_system_message_is_promoted() {
        let request = base();
        assert_eq!(request.resolved_system(), (Some("be terse"), Some(0)));
    }

    #[test]
    fn explicit_system_prompt_wins() {
        let request = GenerationRequest::builder("m")
            .system_prompt("explicit")
            .message(Message::system("history"))
            .build()
            .unwrap();
        assert_eq!(request.resolved_system(), (Some("explicit"), None));
    }
}
