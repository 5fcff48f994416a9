// Agent Step Engine
//
// This crate turns an evolving conversation history into exactly one outbound
// action per step, for an agent that builds ML pipelines with shell, code
// cell, browser and file editing tools.
//
// Key design decisions:
// - Actions, observations and events are closed sum types (serde tagged)
// - The LLM backend is behind the CompletionClient trait; the engine never
//   retries and awaits nothing else
// - History condensation is pluggable via the Condenser trait
// - Actions from one completion are queued and handed out one per step
// - Provider-specific tool schema fixes live in a lookup table keyed by model
// - Errors carry the step stage that produced them

pub mod action;
pub mod agent;
pub mod condenser;
pub mod config;
pub mod conversation_memory;
pub mod error;
pub mod event;
pub mod function_calling;
pub mod llm;
pub mod message;
pub mod model_features;
pub mod observation;
pub mod prompt;
pub mod provider_quirks;
pub mod state;
pub mod tool_types;
pub mod tools;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use action::{Action, ActionKind, FileEdit, MessageAction, TaskCompletion};
pub use agent::{Agent, StepEngine, StepEngineBuilder, AGENT_NAME, EXIT_COMMAND};
pub use condenser::{Condenser, CondenserConfig, CondenserResult, View};
pub use config::{AgentConfig, AgentConfigBuilder, LlmConfig};
pub use conversation_memory::ConversationMemory;
pub use error::{AgentError, Result, StepStage, TranslationError};
pub use event::{Event, EventId, EventPayload, EventSource, ToolCallMetadata};
pub use function_calling::ResponseTranslator;
pub use llm::{
    CompletionClient, CompletionMetadata, CompletionRequest, CompletionResponse, CompletionStream,
    CompletionStreamEvent,
};
pub use message::{ContentPart, Message, Role};
pub use observation::{Observation, ObservationKind};
pub use prompt::PromptManager;
pub use provider_quirks::ProviderQuirks;
pub use state::State;
pub use tool_types::{ToolCall, ToolDescriptor};
pub use tools::Platform;
