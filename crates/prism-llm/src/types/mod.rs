//! Canonical types for LLM request/response representation
//!
//! These types are provider-agnostic. Every adapter converts its vendor's
//! wire format to and from them.

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{Message, Role};
pub use request::{GenerationRequest, GenerationRequestBuilder, RequestOverrides, ResponseFormat};
pub use response::{FinishReason, GenerationResponse, UsageInfo};
pub use stream::{StreamEvent, ToolCallDelta};
pub use tool::{ToolCall, ToolChoice, ToolDefinition};
