//! Tool definition metadata presented to the model service

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition metadata (without the actual tool implementation)
///
/// The parameter schema is advisory for the model; the engine does not
/// enforce it. Malformed arguments are the tool implementation's
/// responsibility to reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    /// Convert to the Gemini function-declaration format
    pub fn to_function_declaration(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_function_declaration_shape() {
        let def = ToolDefinition {
            name: "list_transactions".to_string(),
            description: "List recent transactions".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        };
        let decl = def.to_function_declaration();
        assert_eq!(decl["name"], "list_transactions");
        assert_eq!(decl["parameters"]["type"], "object");
    }
}
