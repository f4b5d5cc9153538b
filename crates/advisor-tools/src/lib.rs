//! advisor-tools: Tool trait, registry, and built-in financial query tools
//!
//! Tools are read-only queries against an in-memory [`FinancialSnapshot`].
//! The registry is populated once at startup and then shared immutably.

pub mod builtin;
pub mod registry;
pub mod snapshot;
pub mod tool;

// Re-export main types
pub use registry::ToolRegistry;
pub use snapshot::FinancialSnapshot;
pub use tool::{BoxedTool, Tool};

use std::sync::Arc;

/// Build a registry holding all built-in tools over the given snapshot
pub fn builtin_registry(snapshot: Arc<FinancialSnapshot>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    builtin::register_builtin_tools(&mut registry, snapshot);
    registry
}
