//! Engine configuration

use std::time::Duration;

/// Configuration for the conversation engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum tool rounds per user turn. Exceeding the bound is not an
    /// error; the loop stops issuing tool rounds and keeps the model's
    /// last text as the terminal message.
    pub max_tool_rounds: usize,
    /// Per-call timeout at the tool execution boundary; expiry is recovered
    /// into an error payload, never a failed turn.
    pub tool_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            tool_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }
}
