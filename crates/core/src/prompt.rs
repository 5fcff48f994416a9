// Prompt manager
//
// Supplies the system prompt used when the history has no system message.
// Prompts can be built in, given inline, or loaded from a directory holding
// `system_prompt.md`.

use std::path::Path;

use crate::error::{AgentError, Result};

/// File read from a prompt directory
pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.md";

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an ML engineering agent. You help users build, train and evaluate machine learning pipelines in a sandboxed workspace.

<ROLE>
* Explore the data before modelling: check shapes, types, missing values and label balance.
* Prefer simple, reproducible baselines first, then iterate.
* Report the metrics you measured, not the ones you expect.
</ROLE>

<WORKSPACE>
* Files uploaded by the user live under /workspace. Write artifacts (models, plots, reports) next to them.
* Use the shell for package installation and long training runs; use the code cell for exploration.
* Keep training runs in the background and poll their logs.
</WORKSPACE>

<COMPLETION>
* When the pipeline is done, call `finish` with a summary of what was built, where the artifacts are and the final metrics.
* If you cannot finish, call `finish` with `task_completed` set to `false` and explain why.
</COMPLETION>"#;

/// Source of the agent's system prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptManager {
    system_prompt: String,
}

impl PromptManager {
    /// Use the given text as the system prompt
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    /// Load `system_prompt.md` from a directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(SYSTEM_PROMPT_FILE);
        let system_prompt = std::fs::read_to_string(&path).map_err(|e| {
            AgentError::config(format!("failed to read {}: {}", path.display(), e))
        })?;

        if system_prompt.trim().is_empty() {
            return Err(AgentError::config(format!(
                "{} is empty",
                path.display()
            )));
        }

        Ok(Self::new(system_prompt))
    }

    /// The system prompt text
    pub fn system_message(&self) -> &str {
        &self.system_prompt
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}
