//! Tool Registry
//!
//! Resolves an `AgentConfig` into the ordered list of tool descriptors offered
//! to the model. The order is part of the contract: identical
//! `(config, model_id, platform)` inputs always produce identical output, and
//! tool position can influence provider-side tool selection.
//!
//! Each tool is in its own file with its name constant and schema.

use tracing::warn;

use crate::config::AgentConfig;
use crate::tool_types::ToolDescriptor;

mod bash;
mod browser;
mod finish;
mod ipython;
mod llm_edit;
mod str_replace_editor;
mod think;

pub use bash::{create_cmd_run_tool, EXECUTE_BASH};
pub use browser::{browser_tool, web_read_tool, BROWSER, WEB_READ};
pub use finish::{finish_tool, FINISH};
pub use ipython::{ipython_tool, EXECUTE_IPYTHON_CELL};
pub use llm_edit::{llm_based_edit_tool, EDIT_FILE};
pub use str_replace_editor::{create_str_replace_editor_tool, STR_REPLACE_EDITOR};
pub use think::{think_tool, THINK};

/// For these models, short tool descriptions are used to stay under the
/// provider's token limit for tool descriptions. Matched as plain substrings.
pub const SHORT_TOOL_DESCRIPTION_LLM_SUBSTRS: &[&str] = &["gpt-", "o3", "o1", "o4"];

/// Operating system the runtime executes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Whether the browser tools can run here
    pub fn supports_browsing(&self) -> bool {
        !matches!(self, Platform::Windows)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Windows => write!(f, "windows"),
            Platform::Other => write!(f, "other"),
        }
    }
}

/// Whether the model gets short tool descriptions
pub fn use_short_tool_description(model_id: &str) -> bool {
    SHORT_TOOL_DESCRIPTION_LLM_SUBSTRS
        .iter()
        .any(|substr| model_id.contains(substr))
}

/// Resolve the ordered tool list for a configuration.
///
/// Order: command, think, finish, web_read + browser, code cell, then one
/// file editor. Browsing on an unsupported platform is logged and skipped.
pub fn resolve(config: &AgentConfig, model_id: &str, platform: Platform) -> Vec<ToolDescriptor> {
    let use_short_desc = use_short_tool_description(model_id);

    let mut tools = Vec::new();
    if config.enable_cmd {
        tools.push(create_cmd_run_tool(use_short_desc));
    }
    if config.enable_think {
        tools.push(think_tool());
    }
    if config.enable_finish {
        tools.push(finish_tool());
    }
    if config.enable_browsing {
        if platform.supports_browsing() {
            tools.push(web_read_tool());
            tools.push(browser_tool());
        } else {
            warn!(platform = %platform, "Browsing tools are not supported on this platform, skipping");
        }
    }
    if config.enable_jupyter {
        tools.push(ipython_tool());
    }
    if config.enable_llm_editor {
        tools.push(llm_based_edit_tool());
    } else if config.enable_editor {
        tools.push(create_str_replace_editor_tool(use_short_desc));
    }
    tools
}

/// Names of the tools, in order
pub fn tool_names(tools: &[ToolDescriptor]) -> Vec<String> {
    tools.iter().map(|t| t.name.clone()).collect()
}
