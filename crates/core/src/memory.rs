// In-memory test doubles
//
// Scripted collaborators for tests and examples:
// - MockCompletionClient returns predefined responses and records requests
// - MockCondenser returns a fixed decision and counts its invocations

use async_trait::async_trait;
use futures::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::action::Action;
use crate::condenser::{Condenser, CondenserResult, View};
use crate::error::{AgentError, Result};
use crate::llm::{
    CompletionClient, CompletionMetadata, CompletionRequest, CompletionResponse, CompletionStream,
    CompletionStreamEvent,
};
use crate::state::State;

// ============================================================================
// MockCompletionClient - Returns predefined responses
// ============================================================================

/// A scripted outcome of one completion call
#[derive(Debug, Clone)]
pub enum MockCompletion {
    /// The call succeeds with this response
    Response(CompletionResponse),
    /// The transport fails with this message
    TransportError(String),
}

impl From<CompletionResponse> for MockCompletion {
    fn from(response: CompletionResponse) -> Self {
        MockCompletion::Response(response)
    }
}

/// Mock completion client for testing
///
/// Returns predefined responses in sequence and logs every request.
#[derive(Debug, Default, Clone)]
pub struct MockCompletionClient {
    responses: Arc<RwLock<Vec<MockCompletion>>>,
    call_index: Arc<RwLock<usize>>,
    call_log: Arc<RwLock<Vec<CompletionRequest>>>,
}

impl MockCompletionClient {
    /// Create a client with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client that returns these responses in order
    pub fn with_responses(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Arc::new(RwLock::new(
                responses.into_iter().map(MockCompletion::from).collect(),
            )),
            ..Self::default()
        }
    }

    /// Add an outcome to the queue
    pub async fn add(&self, outcome: impl Into<MockCompletion>) {
        self.responses.write().await.push(outcome.into());
    }

    /// Add a transport failure to the queue
    pub async fn add_transport_error(&self, message: impl Into<String>) {
        self.add(MockCompletion::TransportError(message.into())).await;
    }

    /// Requests received so far
    pub async fn calls(&self) -> Vec<CompletionRequest> {
        self.call_log.read().await.clone()
    }

    /// Number of requests received so far
    pub async fn call_count(&self) -> usize {
        self.call_log.read().await.len()
    }

    /// Forget responses and calls
    pub async fn reset(&self) {
        self.responses.write().await.clear();
        *self.call_index.write().await = 0;
        self.call_log.write().await.clear();
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete_stream(&self, request: CompletionRequest) -> Result<CompletionStream> {
        self.call_log.write().await.push(request);

        let mut index = self.call_index.write().await;
        let outcome = self
            .responses
            .read()
            .await
            .get(*index)
            .cloned()
            .unwrap_or_else(|| {
                CompletionResponse::text(
                    format!("resp_mock_{}", *index),
                    "Mock response (no more responses configured)",
                )
                .into()
            });
        *index += 1;
        drop(index);

        let response = match outcome {
            MockCompletion::Response(response) => response,
            MockCompletion::TransportError(message) => return Err(AgentError::completion(message)),
        };

        let mut events = Vec::new();
        if let Some(content) = response.content {
            events.push(Ok(CompletionStreamEvent::ContentDelta(content)));
        }
        if !response.tool_calls.is_empty() {
            events.push(Ok(CompletionStreamEvent::ToolCalls(response.tool_calls)));
        }
        events.push(Ok(CompletionStreamEvent::Done(CompletionMetadata {
            response_id: Some(response.id),
            model: response.model,
            ..response.metadata
        })));

        Ok(Box::pin(stream::iter(events)))
    }
}

// ============================================================================
// MockCondenser - Fixed decision, counted invocations
// ============================================================================

/// Mock condenser for testing
///
/// Returns the configured condensation action on every call, or the full
/// history view when none is set.
#[derive(Debug, Clone, Default)]
pub struct MockCondenser {
    condensation: Option<Action>,
    calls: Arc<AtomicUsize>,
}

impl MockCondenser {
    /// Condenser that always returns the full view
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Condenser that always returns this condensation action
    pub fn condensing(action: Action) -> Self {
        Self {
            condensation: Some(action),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared invocation counter, readable after the condenser is boxed
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Number of invocations so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Condenser for MockCondenser {
    fn name(&self) -> &str {
        "mock"
    }

    fn condensed_history(&self, state: &State) -> Result<CondenserResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match &self.condensation {
            Some(action) => CondenserResult::Condensation(action.clone()),
            None => CondenserResult::View(View::from_events(&state.history)),
        })
    }
}
