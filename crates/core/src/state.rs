// Conversation state handed to the agent on every step
//
// The controller owns the history and appends to it; the engine only reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::action::MessageAction;
use crate::event::{Event, EventId};

/// Read-only view of a conversation for one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    /// Conversation identifier
    pub session_id: Uuid,

    /// Number of steps taken so far
    #[serde(default)]
    pub iteration: usize,

    /// Full event history, oldest first
    #[serde(default)]
    pub history: Vec<Event>,
}

impl State {
    /// Create an empty state for a new session
    pub fn new() -> Self {
        Self {
            session_id: Uuid::now_v7(),
            iteration: 0,
            history: Vec::new(),
        }
    }

    /// Create a state with the given history
    pub fn with_history(history: Vec<Event>) -> Self {
        Self {
            history,
            ..Self::new()
        }
    }

    /// Id the next appended event should get
    pub fn next_event_id(&self) -> u64 {
        self.history.last().map(|e| e.id.0 + 1).unwrap_or(0)
    }

    /// Most recent message sent by the user
    pub fn last_user_message(&self) -> Option<&MessageAction> {
        self.history.iter().rev().find_map(Event::as_user_message)
    }

    /// First message sent by the user, with the id of its event
    pub fn initial_user_message(&self) -> Option<(EventId, &MessageAction)> {
        self.history
            .iter()
            .find_map(|e| e.as_user_message().map(|m| (e.id, m)))
    }

    /// Metadata attached to completion requests for tracing on the provider side
    pub fn to_llm_metadata(&self, agent_name: &str) -> Value {
        serde_json::json!({
            "session_id": self.session_id.to_string(),
            "trace_version": env!("CARGO_PKG_VERSION"),
            "tags": [
                format!("agent:{}", agent_name),
                format!("iteration:{}", self.iteration),
            ],
        })
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::event::EventSource;

    fn history() -> Vec<Event> {
        vec![
            Event::action(0, EventSource::Agent, Action::system("You are an ML engineer.")),
            Event::user_message(1, "Load the iris dataset"),
            Event::action(2, EventSource::Agent, Action::message("Which format?")),
            Event::user_message(3, "CSV please"),
        ]
    }

    #[test]
    fn test_last_and_initial_user_message() {
        let state = State::with_history(history());

        assert_eq!(
            state.last_user_message().map(|m| m.content.as_str()),
            Some("CSV please")
        );
        let (id, initial) = state.initial_user_message().unwrap();
        assert_eq!(id, EventId(1));
        assert_eq!(initial.content, "Load the iris dataset");
        assert_eq!(state.next_event_id(), 4);
    }

    #[test]
    fn test_empty_history() {
        let state = State::new();
        assert!(state.last_user_message().is_none());
        assert!(state.initial_user_message().is_none());
        assert_eq!(state.next_event_id(), 0);
    }

    #[test]
    fn test_llm_metadata() {
        let state = State::new();
        let metadata = state.to_llm_metadata("PipelineAgent");
        assert_eq!(metadata["session_id"], state.session_id.to_string());
        assert_eq!(metadata["tags"][0], "agent:PipelineAgent");
    }
}
