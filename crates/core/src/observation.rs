// Observations
//
// Observations are produced by the environment after executing an action.
// The engine never interprets them beyond turning them into message text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::ToolCallMetadata;

/// An observation with the fields shared by every variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(flatten)]
    pub kind: ObservationKind,

    /// Text output shown to the model
    #[serde(default)]
    pub content: String,

    /// Copied from the action when the action came from a tool call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_metadata: Option<ToolCallMetadata>,
}

/// Observation variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "observation", rename_all = "snake_case")]
pub enum ObservationKind {
    CmdOutput {
        command: String,
        exit_code: i32,
    },
    #[serde(rename = "run_ipython")]
    IPythonRunCell {
        code: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        image_urls: Vec<String>,
    },
    FileRead {
        path: String,
    },
    FileEdit {
        path: String,
    },
    BrowserOutput {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        screenshot: Option<String>,
    },
    Think,
    Error,
    /// Summary of condensed history
    AgentCondensation,
    /// The user refused to run the action
    UserReject,
    Mcp {
        name: String,
    },
    Delegate {
        #[serde(default)]
        outputs: Value,
    },
}

impl Observation {
    pub fn new(kind: ObservationKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            tool_call_metadata: None,
        }
    }

    /// Create an error observation
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(ObservationKind::Error, content)
    }

    /// Attach tool call metadata
    pub fn with_tool_call_metadata(mut self, metadata: ToolCallMetadata) -> Self {
        self.tool_call_metadata = Some(metadata);
        self
    }

    /// Image URLs carried by this observation, if any
    pub fn image_urls(&self) -> Vec<&str> {
        match &self.kind {
            ObservationKind::IPythonRunCell { image_urls, .. } => {
                image_urls.iter().map(String::as_str).collect()
            }
            ObservationKind::BrowserOutput {
                screenshot: Some(screenshot),
                ..
            } => vec![screenshot.as_str()],
            _ => Vec::new(),
        }
    }

    /// Render the observation as text for the model
    pub fn to_llm_text(&self) -> String {
        match &self.kind {
            ObservationKind::CmdOutput { command, exit_code } => format!(
                "{}\n[Command `{}` finished with exit code {}]",
                self.content, command, exit_code
            ),
            ObservationKind::BrowserOutput { url, .. } => {
                format!("[Current URL: {}]\n{}", url, self.content)
            }
            ObservationKind::Error => format!(
                "[Error occurred in processing last action]\n{}",
                self.content
            ),
            ObservationKind::UserReject => format!("OBSERVATION:\n{}", self.content),
            ObservationKind::AgentCondensation => {
                format!("Summary of earlier events:\n{}", self.content)
            }
            ObservationKind::Delegate { outputs } => {
                let outputs = serde_json::to_string(outputs).unwrap_or_default();
                format!("{}\nDelegate outputs: {}", self.content, outputs)
            }
            ObservationKind::IPythonRunCell { .. }
            | ObservationKind::FileRead { .. }
            | ObservationKind::FileEdit { .. }
            | ObservationKind::Think
            | ObservationKind::Mcp { .. } => self.content.clone(),
        }
    }
}
