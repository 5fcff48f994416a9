//! Shell command tool

use serde_json::json;

use crate::tool_types::ToolDescriptor;

pub const EXECUTE_BASH: &str = "execute_bash";

const DETAILED_DESCRIPTION: &str = r#"Execute a bash command in the terminal within a persistent shell session.

### Command Execution
* One command at a time: chain dependent commands with `&&` or `;` instead of issuing several calls.
* Persistent session: environment variables, the virtual environment and the working directory carry over between calls.
* Timeout: commands that produce no new output for 30 seconds are paused; use `is_input` to interact with them.

### Long-running Commands
* Run training jobs and servers in the background and redirect their output, e.g. `python train.py > train.log 2>&1 &`.
* If a command is still running, send an empty command to read more output, text to write to its stdin, or `C-c` to interrupt it.

### Best Practices
* Verify that parent directories exist before creating files.
* Prefer absolute paths and avoid `cd` where possible.
* Install missing Python packages with `pip install` before importing them.

### Output Handling
* Output longer than the message limit is truncated in the middle."#;

const SHORT_DESCRIPTION: &str = r#"Execute a bash command in the terminal.
* Long running commands: run them in the background and redirect output to a file.
* Interact with a running process: set `is_input` to `true`; send `C-c` to interrupt.
* One command at a time; chain commands with `&&`."#;

/// Create the shell command tool
pub fn create_cmd_run_tool(use_short_description: bool) -> ToolDescriptor {
    let description = if use_short_description {
        SHORT_DESCRIPTION
    } else {
        DETAILED_DESCRIPTION
    };

    ToolDescriptor::new(
        EXECUTE_BASH,
        description,
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute. Can be empty to read more output of the running process, or `C-c` to interrupt it."
                },
                "is_input": {
                    "type": "string",
                    "description": "If `true`, the command is sent as input to the running process.",
                    "enum": ["true", "false"]
                }
            },
            "required": ["command"]
        }),
    )
}
