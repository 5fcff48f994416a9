// Error types for the step engine
//
// Every failure carries the stage of the step that produced it so the
// controller can tell a broken condenser from a flaky provider.

use thiserror::Error;

/// Result type alias for step engine operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Stage of a step in which an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStage {
    /// Engine construction or configuration loading
    Configuration,
    /// History condensation
    Condensation,
    /// Conversion of events to LLM messages
    MemoryBuild,
    /// The completion call to the LLM backend
    Completion,
    /// Conversion of the completion response to actions
    Translation,
}

impl std::fmt::Display for StepStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStage::Configuration => write!(f, "configuration"),
            StepStage::Condensation => write!(f, "condensation"),
            StepStage::MemoryBuild => write!(f, "memory_build"),
            StepStage::Completion => write!(f, "completion"),
            StepStage::Translation => write!(f, "translation"),
        }
    }
}

/// Errors that can occur while producing an action
#[derive(Debug, Error)]
pub enum AgentError {
    /// Missing or invalid configuration (fatal, construction time)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Condenser failed to produce a view or a condensation
    #[error("Condensation error: {0}")]
    Condensation(String),

    /// Events could not be turned into messages
    #[error("Memory build error: {0}")]
    MemoryBuild(String),

    /// Transport or provider failure during the completion call
    #[error("Completion error: {0}")]
    Completion(String),

    /// Completion response could not be turned into actions
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AgentError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Configuration(msg.into())
    }

    /// Create a condensation error
    pub fn condensation(msg: impl Into<String>) -> Self {
        AgentError::Condensation(msg.into())
    }

    /// Create a memory build error
    pub fn memory(msg: impl Into<String>) -> Self {
        AgentError::MemoryBuild(msg.into())
    }

    /// Create a completion error
    pub fn completion(msg: impl Into<String>) -> Self {
        AgentError::Completion(msg.into())
    }

    /// Stage of the step that failed.
    ///
    /// Internal errors have no stage of their own and are reported as `None`.
    pub fn stage(&self) -> Option<StepStage> {
        match self {
            AgentError::Configuration(_) => Some(StepStage::Configuration),
            AgentError::Condensation(_) => Some(StepStage::Condensation),
            AgentError::MemoryBuild(_) => Some(StepStage::MemoryBuild),
            AgentError::Completion(_) => Some(StepStage::Completion),
            AgentError::Translation(_) => Some(StepStage::Translation),
            AgentError::Internal(_) => None,
        }
    }

    /// Whether the controller may keep driving the agent after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AgentError::Translation(_) | AgentError::Completion(_)
        )
    }
}

/// Reasons a completion response could not be turned into actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// The model called a tool that was not offered
    #[error("tool '{name}' is not registered")]
    UnknownTool { name: String },

    /// Tool call arguments were not a JSON object
    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// A required argument was absent
    #[error("missing required argument '{argument}' for tool '{tool}'")]
    MissingArgument { tool: String, argument: String },

    /// Neither tool calls nor text content
    #[error("response contained no tool calls and no content")]
    EmptyResponse,
}
