//! Web reading and interactive browser tools

use serde_json::json;

use crate::tool_types::ToolDescriptor;

pub const WEB_READ: &str = "web_read";
pub const BROWSER: &str = "browser";

const WEB_READ_DESCRIPTION: &str = r#"Read (convert to markdown) content from a webpage. Prefer this tool over `browser` for reading documentation, dataset cards and papers.

Do not use it for pages that require interaction (logins, forms); use `browser` instead."#;

const BROWSER_DESCRIPTION: &str = r#"Interact with the browser using Python-style action calls.

Available actions:
goto(url: str)
click(bid: str, button: Literal['left', 'middle', 'right'] = 'left')
fill(bid: str, value: str)
select_option(bid: str, options: str | list[str])
scroll(delta_x: float, delta_y: float)
go_back()
go_forward()
upload_file(bid: str, file: str | list[str])

Elements are referenced by the `bid` shown in the page accessibility tree. Several actions may be given, one per line; they run in order."#;

/// Create the web read tool
pub fn web_read_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        WEB_READ,
        WEB_READ_DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the webpage to read."
                }
            },
            "required": ["url"]
        }),
    )
}

/// Create the interactive browser tool
pub fn browser_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        BROWSER,
        BROWSER_DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The Python-style browser actions to run."
                }
            },
            "required": ["code"]
        }),
    )
}
