//! String-replace file editor tool

use serde_json::json;

use crate::tool_types::ToolDescriptor;

pub const STR_REPLACE_EDITOR: &str = "str_replace_editor";

const DETAILED_DESCRIPTION: &str = r#"Custom editing tool for viewing, creating and editing files in plain-text format.
* State is persistent across calls.
* `view` on a file shows numbered lines (like `cat -n`); on a directory it lists files up to 2 levels deep.
* `create` fails if the path already exists.
* Long outputs are truncated and marked with `<response clipped>`.
* `undo_edit` reverts the last edit made to the file.

Notes for `str_replace`:
* `old_str` must match EXACTLY one or more consecutive lines of the file, including whitespace.
* If `old_str` is not unique the replacement is not performed; include enough surrounding context to make it unique.
* `new_str` replaces `old_str` verbatim.

Notes for `insert`:
* `new_str` is inserted AFTER line `insert_line`."#;

const SHORT_DESCRIPTION: &str = r#"Custom editing tool for viewing, creating and editing files.
* `view` shows numbered lines or a directory listing; `create` fails on existing paths.
* `str_replace` needs an `old_str` that matches exactly and uniquely.
* `insert` adds `new_str` after `insert_line`; `undo_edit` reverts the last edit."#;

/// Create the string-replace editor tool
pub fn create_str_replace_editor_tool(use_short_description: bool) -> ToolDescriptor {
    let description = if use_short_description {
        SHORT_DESCRIPTION
    } else {
        DETAILED_DESCRIPTION
    };

    ToolDescriptor::new(
        STR_REPLACE_EDITOR,
        description,
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "enum": ["view", "create", "str_replace", "insert", "undo_edit"],
                    "description": "The command to run."
                },
                "path": {
                    "type": "string",
                    "description": "Absolute path to the file or directory."
                },
                "file_text": {
                    "type": "string",
                    "description": "Required for `create`: content of the new file."
                },
                "old_str": {
                    "type": "string",
                    "description": "Required for `str_replace`: the exact text to replace."
                },
                "new_str": {
                    "type": "string",
                    "description": "Replacement text for `str_replace`, or text to insert for `insert`."
                },
                "insert_line": {
                    "type": "integer",
                    "description": "Required for `insert`: line after which `new_str` is inserted."
                },
                "view_range": {
                    "type": "array",
                    "items": {"type": "integer"},
                    "description": "Optional for `view`: `[start, end]` line range; `end = -1` shows to the end."
                }
            },
            "required": ["command", "path"]
        }),
    )
}
