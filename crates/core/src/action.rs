// Actions
//
// Everything the user or the agent can do in a conversation is an Action.
// The set of variants is closed so the memory builder and the response
// translator can match on it exhaustively.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{EventId, ToolCallMetadata};
use crate::tool_types::ToolDescriptor;

/// An action with the fields shared by every variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The variant-specific payload
    #[serde(flatten)]
    pub kind: ActionKind,

    /// Reasoning text the model produced alongside the action
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thought: String,

    /// Set when the action was produced by a tool call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_metadata: Option<ToolCallMetadata>,
}

/// Action variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionKind {
    /// Free text from the user or the agent
    Message(MessageAction),
    /// The system prompt (and the tools it was issued with)
    System(SystemMessageAction),
    /// Terminal action: the agent is done
    Finish(AgentFinishAction),
    /// The agent logs a thought; the thought lives in `Action::thought`
    Think,
    /// Run a shell command
    CmdRun(CmdRunAction),
    /// Run a code cell in the IPython kernel
    #[serde(rename = "run_ipython")]
    IPythonRunCell(IPythonRunCellAction),
    /// Read a file
    FileRead(FileReadAction),
    /// Create or modify a file
    FileEdit(FileEditAction),
    /// Fetch a web page as text
    BrowseUrl(BrowseUrlAction),
    /// Drive the interactive browser
    BrowseInteractive(BrowseInteractiveAction),
    /// Hand a subtask to another agent
    Delegate(AgentDelegateAction),
    /// Call a tool exposed by an MCP server
    Mcp(McpAction),
    /// Record that part of the history was condensed
    Condensation(CondensationAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAction {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub wait_for_response: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessageAction {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,
}

/// How the agent judged its own outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCompletion {
    True,
    False,
    Partial,
}

impl TaskCompletion {
    /// Parse the value the finish tool accepts ("true", "false", "partial")
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "true" => Some(TaskCompletion::True),
            "false" => Some(TaskCompletion::False),
            "partial" => Some(TaskCompletion::Partial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentFinishAction {
    /// Final message for the user
    #[serde(default)]
    pub final_thought: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_completed: Option<TaskCompletion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdRunAction {
    pub command: String,
    /// The command is input for an already running process
    #[serde(default)]
    pub is_input: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IPythonRunCellAction {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReadAction {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_range: Option<[i64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEditAction {
    pub path: String,
    pub edit: FileEdit,
}

/// The edit operation requested for a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum FileEdit {
    /// Rewrite lines `start..=end` with `content`, delegated to an editing LLM
    Llm { content: String, start: i64, end: i64 },
    Create { file_text: String },
    StrReplace { old_str: String, new_str: String },
    Insert { insert_line: u64, new_str: String },
    UndoEdit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseUrlAction {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseInteractiveAction {
    pub browser_actions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDelegateAction {
    pub agent: String,
    #[serde(default)]
    pub inputs: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpAction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Marks events the condenser decided to forget.
///
/// Once this action is in the history, `View::from_events` hides the
/// forgotten events and, if present, shows `summary` at `summary_offset`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CondensationAction {
    pub forgotten_event_ids: Vec<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_offset: Option<usize>,
}

impl Action {
    /// Wrap a variant with no thought and no tool call metadata
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            thought: String::new(),
            tool_call_metadata: None,
        }
    }

    /// Create a message action
    pub fn message(content: impl Into<String>) -> Self {
        Self::new(ActionKind::Message(MessageAction {
            content: content.into(),
            image_urls: Vec::new(),
            wait_for_response: false,
        }))
    }

    /// Create a system message action
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ActionKind::System(SystemMessageAction {
            content: content.into(),
            tools: Vec::new(),
        }))
    }

    /// Create a finish action with no final message
    pub fn finish() -> Self {
        Self::new(ActionKind::Finish(AgentFinishAction::default()))
    }

    /// Create a shell command action
    pub fn cmd_run(command: impl Into<String>) -> Self {
        Self::new(ActionKind::CmdRun(CmdRunAction {
            command: command.into(),
            is_input: false,
        }))
    }

    /// Create a code cell action
    pub fn run_ipython(code: impl Into<String>) -> Self {
        Self::new(ActionKind::IPythonRunCell(IPythonRunCellAction { code: code.into() }))
    }

    /// Create a think action
    pub fn think(thought: impl Into<String>) -> Self {
        Self::new(ActionKind::Think).with_thought(thought)
    }

    /// Set the thought
    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = thought.into();
        self
    }

    /// Attach tool call metadata
    pub fn with_tool_call_metadata(mut self, metadata: ToolCallMetadata) -> Self {
        self.tool_call_metadata = Some(metadata);
        self
    }

    /// Prepend model text to the existing thought
    pub fn prepend_thought(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.thought = if self.thought.is_empty() {
            text.to_string()
        } else {
            format!("{}\n{}", text, self.thought)
        };
    }

    /// Whether this action ends the conversation
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, ActionKind::Finish(_))
    }

    /// Short name of the variant (for logging)
    pub fn name(&self) -> &'static str {
        match &self.kind {
            ActionKind::Message(_) => "message",
            ActionKind::System(_) => "system",
            ActionKind::Finish(_) => "finish",
            ActionKind::Think => "think",
            ActionKind::CmdRun(_) => "run",
            ActionKind::IPythonRunCell(_) => "run_ipython",
            ActionKind::FileRead(_) => "read",
            ActionKind::FileEdit(_) => "edit",
            ActionKind::BrowseUrl(_) => "browse",
            ActionKind::BrowseInteractive(_) => "browse_interactive",
            ActionKind::Delegate(_) => "delegate",
            ActionKind::Mcp(_) => "call_tool_mcp",
            ActionKind::Condensation(_) => "condensation",
        }
    }
}
