// Step engine
//
// StepEngine turns the conversation state into exactly one action per call
// to `step`. A single completion may yield several actions; they are queued
// and handed out one per step before the model is called again.
//
// Step order:
// 1. pending queue
// 2. exit command
// 3. condenser (a condensation ends the step)
// 4. memory builder
// 5. provider tool shaping
// 6. completion call
// 7. response translation, then enqueue the batch and pop its head
//
// The queue is only modified after translation succeeds, so a failed or
// cancelled step leaves it as it was.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::action::Action;
use crate::condenser::{self, Condenser, CondenserResult, View};
use crate::config::{AgentConfig, LlmConfig};
use crate::conversation_memory::ConversationMemory;
use crate::error::{AgentError, Result, TranslationError};
use crate::function_calling::ResponseTranslator;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::message::Message;
use crate::prompt::PromptManager;
use crate::provider_quirks::ProviderQuirks;
use crate::state::State;
use crate::tool_types::ToolDescriptor;
use crate::tools::{self, Platform};

/// Name reported to the provider in request metadata
pub const AGENT_NAME: &str = "PipelineAgent";

/// User message that ends the conversation without calling the model
pub const EXIT_COMMAND: &str = "/exit";

/// An agent driven by a controller, one action per step
#[async_trait]
pub trait Agent: Send {
    /// Agent name
    fn name(&self) -> &str;

    /// Drop any state carried between steps
    fn reset(&mut self);

    /// Produce the next action for this state
    async fn step(&mut self, state: &State) -> Result<Action>;
}

/// The step engine
pub struct StepEngine {
    config: AgentConfig,
    llm_config: LlmConfig,
    client: Arc<dyn CompletionClient>,
    condenser: Box<dyn Condenser>,
    memory: ConversationMemory,
    tools: Vec<ToolDescriptor>,
    translator: ResponseTranslator,
    quirks: ProviderQuirks,
    pending_actions: VecDeque<Action>,
}

impl StepEngine {
    /// Start building an engine
    pub fn builder(config: AgentConfig, llm_config: LlmConfig) -> StepEngineBuilder {
        StepEngineBuilder::new(config, llm_config)
    }

    /// Tools offered to the model, in order (before provider shaping)
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn llm_config(&self) -> &LlmConfig {
        &self.llm_config
    }

    /// Number of actions waiting to be returned
    pub fn pending_len(&self) -> usize {
        self.pending_actions.len()
    }

    /// Put previously queued actions back, e.g. after restoring a session.
    ///
    /// They are returned after anything already queued.
    pub fn restore_pending(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.pending_actions.extend(actions);
    }

    fn build_messages(&self, state: &State, view: &View) -> Result<Vec<Message>> {
        let mut messages = self
            .memory
            .process_events(
                &view.events,
                state.initial_user_message(),
                self.llm_config.max_message_chars,
                self.llm_config.vision_is_active(),
            )
            .map_err(|e| match e {
                AgentError::MemoryBuild(_) => e,
                other => AgentError::memory(other.to_string()),
            })?;

        if self.llm_config.is_caching_prompt_active() {
            self.memory.apply_prompt_caching(&mut messages);
        }
        Ok(messages)
    }
}

#[async_trait]
impl Agent for StepEngine {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    fn reset(&mut self) {
        self.pending_actions.clear();
    }

    async fn step(&mut self, state: &State) -> Result<Action> {
        if let Some(action) = self.pending_actions.pop_front() {
            debug!(
                action = action.name(),
                remaining = self.pending_actions.len(),
                "Returning queued action"
            );
            return Ok(action);
        }

        if let Some(message) = state.last_user_message() {
            if message.content.trim() == EXIT_COMMAND {
                info!(session_id = %state.session_id, "Exit command received");
                return Ok(Action::finish());
            }
        }

        let view = match self
            .condenser
            .condensed_history(state)
            .map_err(|e| match e {
                AgentError::Condensation(_) => e,
                other => AgentError::condensation(other.to_string()),
            })? {
            CondenserResult::View(view) => view,
            CondenserResult::Condensation(action) => {
                debug!(condenser = self.condenser.name(), "Condenser requested condensation");
                return Ok(action);
            }
        };
        debug!(
            condenser = self.condenser.name(),
            history = state.history.len(),
            view = view.len(),
            "Condensed history"
        );

        let messages = self.build_messages(state, &view)?;
        let tools = self.quirks.shape_tools(&self.llm_config.model, &self.tools);

        let request = CompletionRequest {
            messages,
            tools,
            metadata: state.to_llm_metadata(AGENT_NAME),
        };
        debug!(
            model = %self.llm_config.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Calling completion client"
        );

        let response = self.client.complete(request).await.map_err(|e| match e {
            AgentError::Completion(_) => e,
            other => AgentError::completion(other.to_string()),
        })?;
        debug!(
            response_id = %response.id,
            tool_calls = response.tool_calls.len(),
            "Received completion response"
        );

        let actions = self.translator.translate(&response)?;
        self.pending_actions.extend(actions);

        // translate never returns an empty batch
        self.pending_actions
            .pop_front()
            .ok_or_else(|| TranslationError::EmptyResponse.into())
    }
}

/// Builder for StepEngine with fluent API
pub struct StepEngineBuilder {
    config: AgentConfig,
    llm_config: LlmConfig,
    client: Option<Arc<dyn CompletionClient>>,
    prompt_manager: Option<PromptManager>,
    condenser: Option<Box<dyn Condenser>>,
    platform: Platform,
    mcp_tools: Vec<ToolDescriptor>,
    quirks: ProviderQuirks,
}

impl StepEngineBuilder {
    pub fn new(config: AgentConfig, llm_config: LlmConfig) -> Self {
        Self {
            config,
            llm_config,
            client: None,
            prompt_manager: None,
            condenser: None,
            platform: Platform::current(),
            mcp_tools: Vec::new(),
            quirks: ProviderQuirks::default(),
        }
    }

    /// Set the completion client (required)
    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the prompt manager (required)
    pub fn prompt_manager(mut self, prompt_manager: PromptManager) -> Self {
        self.prompt_manager = Some(prompt_manager);
        self
    }

    /// Use this condenser instead of the one named in the configuration
    pub fn condenser(mut self, condenser: Box<dyn Condenser>) -> Self {
        self.condenser = Some(condenser);
        self
    }

    /// Resolve tools for this platform instead of the current one
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Offer tools exposed by MCP servers after the built-in ones
    pub fn mcp_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.mcp_tools = tools;
        self
    }

    /// Replace the provider quirk table
    pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<StepEngine> {
        let client = self
            .client
            .ok_or_else(|| AgentError::config("a completion client is required"))?;
        let prompt_manager = self
            .prompt_manager
            .ok_or_else(|| AgentError::config("a prompt manager is required"))?;
        let condenser = match self.condenser {
            Some(condenser) => condenser,
            None => condenser::from_config(&self.config.condenser)?,
        };

        let mut offered = tools::resolve(&self.config, &self.llm_config.model, self.platform);
        let translator = ResponseTranslator::new(
            offered.iter().map(|t| t.name.clone()),
            self.mcp_tools.iter().map(|t| t.name.clone()),
        );
        offered.extend(self.mcp_tools);

        info!(
            model = %self.llm_config.model,
            platform = %self.platform,
            condenser = condenser.name(),
            tools = ?tools::tool_names(&offered),
            "Step engine ready"
        );

        Ok(StepEngine {
            config: self.config,
            llm_config: self.llm_config,
            client,
            condenser,
            memory: ConversationMemory::new(prompt_manager),
            tools: offered,
            translator,
            quirks: self.quirks,
            pending_actions: VecDeque::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::llm::CompletionResponse;
    use crate::memory::{MockCompletionClient, MockCondenser};
    use crate::tool_types::ToolCall;

    fn engine(client: MockCompletionClient, condenser: MockCondenser) -> StepEngine {
        StepEngine::builder(AgentConfig::default(), LlmConfig::new("claude-3-7-sonnet"))
            .client(Arc::new(client))
            .prompt_manager(PromptManager::default())
            .condenser(Box::new(condenser))
            .platform(Platform::Linux)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_reset_clears_queue() {
        let mut engine = engine(MockCompletionClient::new(), MockCondenser::passthrough());
        engine.restore_pending(vec![Action::cmd_run("ls"), Action::finish()]);
        assert_eq!(engine.pending_len(), 2);

        engine.reset();
        assert_eq!(engine.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_exit_is_trimmed() {
        let client = MockCompletionClient::new();
        let mut engine = engine(client.clone(), MockCondenser::passthrough());
        let state = State::with_history(vec![Event::user_message(0, "  /exit\n")]);

        let action = engine.step(&state).await.unwrap();
        assert!(action.is_terminal());
        assert_eq!(client.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_request_carries_metadata_and_tools() {
        let client = MockCompletionClient::with_responses(vec![CompletionResponse::tool_calls(
            "resp_1",
            vec![ToolCall::new("c1", "think", r#"{"thought": "check class balance"}"#)],
        )]);
        let mut engine = engine(client.clone(), MockCondenser::passthrough());
        let state = State::with_history(vec![Event::user_message(0, "train on data.csv")]);

        let action = engine.step(&state).await.unwrap();
        assert_eq!(action.thought, "check class balance");

        let calls = client.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tools, engine.tools());
        assert_eq!(calls[0].metadata["tags"][0], format!("agent:{}", AGENT_NAME));
        // Claude models get prompt caching marks
        assert!(calls[0].messages[0].cache_prompt);
    }

    #[tokio::test]
    async fn test_mcp_tools_are_offered_and_translated() {
        let client = MockCompletionClient::with_responses(vec![CompletionResponse::tool_calls(
            "resp_1",
            vec![ToolCall::new("c1", "dataset_lookup", r#"{"name": "iris"}"#)],
        )]);
        let mut engine = StepEngine::builder(AgentConfig::none(), LlmConfig::new("gpt-4o"))
            .client(Arc::new(client))
            .prompt_manager(PromptManager::default())
            .mcp_tools(vec![ToolDescriptor::new(
                "dataset_lookup",
                "Look up a dataset",
                serde_json::json!({"type": "object", "properties": {"name": {"type": "string"}}}),
            )])
            .build()
            .unwrap();

        assert_eq!(tools::tool_names(engine.tools()), vec!["dataset_lookup"]);
        let action = engine
            .step(&State::with_history(vec![Event::user_message(0, "find iris")]))
            .await
            .unwrap();
        assert_eq!(action.name(), "call_tool_mcp");
    }

    #[tokio::test]
    async fn test_empty_response_fails_in_translation() {
        let client = MockCompletionClient::with_responses(vec![CompletionResponse::tool_calls(
            "resp_1",
            Vec::new(),
        )]);
        let mut engine = engine(client, MockCondenser::passthrough());
        let state = State::with_history(vec![Event::user_message(0, "fit a baseline")]);

        let err = engine.step(&state).await.unwrap_err();
        assert_eq!(err.stage(), Some(crate::error::StepStage::Translation));
        assert_eq!(engine.pending_len(), 0);
    }

    #[test]
    fn test_build_requires_client() {
        let result = StepEngine::builder(AgentConfig::default(), LlmConfig::default())
            .prompt_manager(PromptManager::default())
            .build();
        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }
}
