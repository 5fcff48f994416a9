// Completion client abstraction
//
// The engine talks to the LLM backend only through CompletionClient. Provider
// clients implement the streaming call; the non-streaming call used by the
// engine folds the stream into a single response. No retries happen here.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool_types::{ToolCall, ToolDescriptor};

// ============================================================================
// Request / Response
// ============================================================================

/// A completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Conversation messages, system message first
    pub messages: Vec<Message>,
    /// Tools offered to the model, in order
    pub tools: Vec<ToolDescriptor>,
    /// Tracing metadata forwarded to the provider
    #[serde(default)]
    pub metadata: Value,
}

/// A complete model response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Provider response id
    pub id: String,
    /// Model that produced the response
    #[serde(default)]
    pub model: Option<String>,
    /// Assistant text, if any
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls, in the order the model emitted them
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Token usage and finish reason
    #[serde(default)]
    pub metadata: CompletionMetadata,
}

impl CompletionResponse {
    /// Response with text only
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Response with tool calls only
    pub fn tool_calls(id: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            id: id.into(),
            tool_calls,
            ..Default::default()
        }
    }

    /// Set the assistant text
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Assistant text with surrounding whitespace removed, if non-empty
    pub fn content_text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Streaming
// ============================================================================

/// Type alias for the completion response stream
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionStreamEvent>> + Send>>;

/// Events emitted during a streaming completion
#[derive(Debug, Clone)]
pub enum CompletionStreamEvent {
    /// Text delta (incremental content)
    ContentDelta(String),
    /// Tool calls from the model
    ToolCalls(Vec<ToolCall>),
    /// Streaming completed
    Done(CompletionMetadata),
    /// Error during streaming
    Error(String),
}

/// Metadata about a completion
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionMetadata {
    /// Provider response id
    pub response_id: Option<String>,
    /// Model used
    pub model: Option<String>,
    /// Prompt tokens
    pub prompt_tokens: Option<u32>,
    /// Completion tokens
    pub completion_tokens: Option<u32>,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// LLM backend used by the step engine
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Call the model with streaming
    async fn complete_stream(&self, request: CompletionRequest) -> Result<CompletionStream>;

    /// Call the model and wait for the full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        use futures::StreamExt;

        let mut stream = self.complete_stream(request).await?;
        let mut content = String::new();
        let mut tool_calls = Vec::new();
        let mut metadata = CompletionMetadata::default();

        while let Some(event) = stream.next().await {
            match event? {
                CompletionStreamEvent::ContentDelta(delta) => content.push_str(&delta),
                CompletionStreamEvent::ToolCalls(calls) => tool_calls.extend(calls),
                CompletionStreamEvent::Done(meta) => metadata = meta,
                CompletionStreamEvent::Error(err) => return Err(AgentError::completion(err)),
            }
        }

        // Tool call metadata needs a response id even if the provider sent none
        let id = metadata
            .response_id
            .clone()
            .unwrap_or_else(|| format!("resp_{}", uuid::Uuid::now_v7()));

        Ok(CompletionResponse {
            id,
            model: metadata.model.clone(),
            content: if content.is_empty() {
                None
            } else {
                Some(content)
            },
            tool_calls,
            metadata,
        })
    }
}
