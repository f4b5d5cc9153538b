//! Tool Registry
//!
//! A static catalog mapping tool name to definition and implementation.
//! Registration happens once at startup; after that the registry is shared
//! behind an `Arc` and never mutated, so lookups need no locking.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use advisor_core::ToolDefinition;

use crate::tool::BoxedTool;

/// Static tool registry
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<Arc<str>, BoxedTool>,
    /// Definitions in registration order, as presented to the model
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Re-registering a name replaces the implementation
    /// but keeps the original catalog position.
    pub fn register(&mut self, tool: BoxedTool) {
        let name: Arc<str> = Arc::from(tool.name());
        let definition = tool.definition();

        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replacing previously registered tool");
            if let Some(existing) = self.definitions.iter_mut().find(|d| *d.name == *name) {
                *existing = definition;
            }
        } else {
            self.definitions.push(definition);
        }

        debug!(tool = %name, "Registered tool");
    }

    /// Resolve a tool implementation by name
    pub fn resolve(&self, name: &str) -> Option<BoxedTool> {
        self.tools.get(name).cloned()
    }

    /// Tool definitions in registration order, for presentation to the model
    pub fn describe(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
