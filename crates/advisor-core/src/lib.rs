//! advisor-core: Protocol types for the advisor conversation engine
//!
//! Defines the message/part vocabulary shared between the orchestrator and
//! the view layer, the rich-content payloads, tool definitions, and the
//! common error type.

pub mod error;
pub mod message;
pub mod rich;
pub mod tool;

// Re-export main types
pub use error::{Error, Result};
pub use message::{Message, Part, Role};
pub use rich::RichContent;
pub use tool::ToolDefinition;
