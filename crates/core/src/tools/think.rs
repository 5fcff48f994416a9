//! Think tool

use serde_json::json;

use crate::tool_types::ToolDescriptor;

pub const THINK: &str = "think";

const DESCRIPTION: &str = r#"Use the tool to think about something. It will not obtain new information or change the environment, but just log the thought.

Common use cases:
1. When exploring a dataset, list candidate features and label leaks before writing preprocessing code.
2. After an evaluation run, reason about why a metric moved before changing hyperparameters.
3. When several modelling approaches fit, weigh them before committing to one."#;

/// Create the think tool
pub fn think_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        THINK,
        DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "thought": {
                    "type": "string",
                    "description": "The thought to log."
                }
            },
            "required": ["thought"]
        }),
    )
}
