//! advisor-engine: Agentic tool-calling conversation engine
//!
//! The core control loop behind the advisor chat surfaces: user input goes
//! to the model service; requested tool calls are executed concurrently
//! against the tool registry; results are fed back to the model; the loop
//! repeats under a bounded round count until the model produces a final
//! answer. All state changes flow through the pure reducer in [`state`].

pub mod config;
pub mod engine;
pub mod executor;
pub mod state;

// Re-export main types
pub use config::EngineConfig;
pub use engine::ConversationEngine;
pub use executor::ToolExecutor;
pub use state::{reduce, Action, ConversationState};
