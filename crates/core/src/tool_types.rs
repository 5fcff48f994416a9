// Tool descriptors and tool calls
//
// Design Decision: Tools are identified by name (string). The descriptor is
// what the completion interface sees; the concrete implementation lives in the
// runtime and is out of reach of the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable capability offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name (used by the LLM and for action translation)
    pub name: String,
    /// Tool description for the LLM
    pub description: String,
    /// JSON schema for tool parameters
    pub parameters: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Parameter properties of the schema, if it has any
    pub fn properties(&self) -> Option<&serde_json::Map<String, Value>> {
        self.parameters.get("properties").and_then(Value::as_object)
    }

    /// Mutable access to the parameter properties
    pub fn properties_mut(&mut self) -> Option<&mut serde_json::Map<String, Value>> {
        self.parameters
            .get_mut("properties")
            .and_then(Value::as_object_mut)
    }

    /// OpenAI-style function tool representation
    pub fn to_function_json(&self) -> Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Tool call from an LLM response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this tool call
    pub id: String,
    /// Tool name to execute
    pub name: String,
    /// Arguments as the raw JSON string returned by the provider
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_access() {
        let mut tool = ToolDescriptor::new(
            "edit_file",
            "Edit a file",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "start": {"type": "integer", "default": 1}
                }
            }),
        );

        assert!(tool.properties().unwrap().contains_key("start"));
        tool.properties_mut()
            .unwrap()
            .insert("end".to_string(), serde_json::json!({"type": "integer"}));
        assert_eq!(tool.properties().unwrap().len(), 2);
    }

    #[test]
    fn test_descriptor_without_properties() {
        let tool = ToolDescriptor::new("noop", "Does nothing", serde_json::json!({}));
        assert!(tool.properties().is_none());
    }

    #[test]
    fn test_function_json() {
        let tool = ToolDescriptor::new("think", "Log a thought", serde_json::json!({}));
        let json = tool.to_function_json();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "think");
    }

    #[test]
    fn test_tool_call_serialization() {
        let tool_call = ToolCall::new("call_123", "execute_bash", r#"{"command":"ls"}"#);
        let json = serde_json::to_string(&tool_call).unwrap();
        let parsed: ToolCall = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tool_call);
    }
}
