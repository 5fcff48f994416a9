//! LLM-based file editing tool
//!
//! The model supplies the new content of a line range; a separate editing
//! model merges it into the file.

use serde_json::json;

use crate::tool_types::ToolDescriptor;

pub const EDIT_FILE: &str = "edit_file";

const DESCRIPTION: &str = r#"Edit a file in plain-text format.
* Provide the new content of the lines `start` to `end` (1-indexed, inclusive); `end = -1` means the end of the file.
* Unchanged regions can be elided with a comment such as `# ... existing code ...`.
* To create a new file, give the full content and leave `start` and `end` at their defaults.
* Keep each edit small; prefer several edits over rewriting a large file."#;

/// Create the LLM-based file editing tool
pub fn llm_based_edit_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        EDIT_FILE,
        DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute path to the file to edit."
                },
                "content": {
                    "type": "string",
                    "description": "The new content of the edited range."
                },
                "start": {
                    "type": "integer",
                    "description": "First line of the range to edit (1-indexed).",
                    "default": 1
                },
                "end": {
                    "type": "integer",
                    "description": "Last line of the range to edit; -1 for the end of the file.",
                    "default": -1
                }
            },
            "required": ["path", "content"]
        }),
    )
}
