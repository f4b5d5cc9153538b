//! Core Tool trait and types
//!
//! Defines the interface every tool must satisfy to participate in the
//! conversation engine.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use advisor_core::ToolDefinition;

/// Core trait for all tools
///
/// Implementations should resolve with either a domain payload or an
/// `{"error": ...}` payload; returning `Err` is reserved for truly
/// unexpected faults, which the execution adapter recovers into the same
/// shape.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name (unique identifier)
    fn name(&self) -> &str;

    /// Get human-readable description
    fn description(&self) -> &str;

    /// Get JSON schema describing the expected arguments
    fn input_schema(&self) -> Value;

    /// Execute the tool with given arguments
    async fn execute(&self, args: Value) -> Result<Value>;

    /// Build the definition presented to the model service
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema(),
        }
    }
}

/// Type alias for shared tool trait objects
pub type BoxedTool = Arc<dyn Tool>;

/// Closure-backed tool, mainly for tests
#[derive(Clone)]
pub struct FnTool {
    name: String,
    description: String,
    schema: Value,
    handler: Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>,
}

impl FnTool {
    pub fn new<F>(name: &str, description: &str, schema: Value, handler: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            handler: Arc::new(handler),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        (self.handler)(args)
    }
}
