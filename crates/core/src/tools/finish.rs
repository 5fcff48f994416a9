//! Finish tool

use serde_json::json;

use crate::tool_types::ToolDescriptor;

pub const FINISH: &str = "finish";

const DESCRIPTION: &str = r#"Signals the completion of the current task or conversation.

Use this tool when:
- The pipeline has been built, evaluated and its results reported
- The task cannot be completed and the reason has been explained
- The user's request requires no further action

The message should summarise what was done, where the artifacts are, and the final metrics."#;

/// Create the finish tool
pub fn finish_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        FINISH,
        DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Final message to send to the user."
                },
                "task_completed": {
                    "type": "string",
                    "enum": ["true", "false", "partial"],
                    "description": "Whether the task was completed."
                }
            },
            "required": ["message", "task_completed"]
        }),
    )
}
