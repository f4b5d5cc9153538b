//! Model provider trait and request/response shapes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use advisor_core::{Error, Part, Result};

/// One tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub args: Value,
}

/// Input for one model turn: either fresh user text or the settled results
/// of the previous tool round (as `Part::ToolResult` values).
#[derive(Debug, Clone)]
pub enum TurnInput {
    UserText(String),
    ToolResults(Vec<Part>),
}

/// Model response for one turn
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelTurn {
    /// Whether this turn requests any tool invocations
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The opaque model service boundary
///
/// Implementations manage conversation history themselves; the engine never
/// re-transmits it. `send_turn` must return requested tool calls with names
/// drawn from the catalog the provider was constructed with.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn send_turn(&self, input: TurnInput) -> Result<ModelTurn>;
}

/// Convenience for provider implementations: a malformed response error
pub fn malformed_response(detail: impl Into<String>) -> Error {
    Error::model(format!("malformed model response: {}", detail.into()))
}
