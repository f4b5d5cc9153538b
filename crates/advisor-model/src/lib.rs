//! advisor-model: Model service boundary for the advisor engine
//!
//! The engine talks to a language model through the [`ModelProvider`] trait
//! only. Providers own the conversation history; the engine sends either the
//! user's text or the latest round of tool results and gets back text plus
//! any requested tool calls.

pub mod gemini;
pub mod provider;

// Re-export main types
pub use gemini::GeminiClient;
pub use provider::{ModelProvider, ModelTurn, ToolCallRequest, TurnInput};
