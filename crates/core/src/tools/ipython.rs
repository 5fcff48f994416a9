//! IPython code cell tool

use serde_json::json;

use crate::tool_types::ToolDescriptor;

pub const EXECUTE_IPYTHON_CELL: &str = "execute_ipython_cell";

const DESCRIPTION: &str = r#"Run a cell of Python code in an IPython environment.
* Variables, imports and loaded datasets persist between cells.
* Use it for data exploration, plotting and interactive model experiments.
* Shell commands can be run with a leading `!`, e.g. `!pip install scikit-learn`.
* Plots rendered inline are returned as images when the model supports vision."#;

/// Create the code cell tool
pub fn ipython_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        EXECUTE_IPYTHON_CELL,
        DESCRIPTION,
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The Python code to execute."
                }
            },
            "required": ["code"]
        }),
    )
}
