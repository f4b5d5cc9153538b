//! Tool execution adapter
//!
//! Resolves a requested tool against the registry, invokes it under a
//! timeout, and normalizes success and failure into a uniform
//! `Part::ToolResult`. Every failure mode is recovered into an
//! `{"error": ...}` payload so one bad call can never abort sibling calls
//! executing concurrently. The adapter itself is stateless.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use advisor_core::Part;
use advisor_tools::ToolRegistry;

/// Stateless adapter between the orchestrator and tool implementations
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Execute one tool call, always yielding a result part
    pub async fn execute(&self, name: &str, args: Value) -> Part {
        let Some(tool) = self.registry.resolve(name) else {
            warn!(tool = %name, "Unknown tool requested by model");
            return Part::tool_result(name, json!({"error": "unknown tool"}));
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, tool.execute(args)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(Ok(value)) => {
                debug!(tool = %name, elapsed_ms, "Tool call succeeded");
                if value.is_object() {
                    value
                } else {
                    // Tools contract a mapping; wrap scalar payloads
                    json!({"value": value})
                }
            }
            Ok(Err(e)) => {
                warn!(tool = %name, elapsed_ms, error = %e, "Tool call failed");
                json!({"error": e.to_string()})
            }
            Err(_) => {
                warn!(tool = %name, elapsed_ms, "Tool call timed out");
                json!({"error": format!("tool '{}' timed out after {:?}", name, self.timeout)})
            }
        };

        Part::tool_result(name, response)
    }
}
