// Event envelope
//
// An Event is one immutable entry of the conversation history: either an
// Action produced by the user or the agent, or an Observation produced by the
// environment in response to an action. The history itself is owned by the
// controller; the engine only reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionKind, MessageAction};
use crate::observation::Observation;

/// Position of an event in the history stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    User,
    Agent,
    Environment,
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSource::User => write!(f, "user"),
            EventSource::Agent => write!(f, "agent"),
            EventSource::Environment => write!(f, "environment"),
        }
    }
}

/// Links an action or observation to the tool call it came from.
///
/// Attached by the response translator to every action derived from a tool
/// call, and copied by the runtime onto the matching observation. The memory
/// builder uses it to rebuild the assistant turn and to pair tool results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallMetadata {
    /// Name of the function the model called
    pub function_name: String,
    /// Provider-assigned tool call id
    pub tool_call_id: String,
    /// Id of the completion response that contained the call
    pub model_response_id: String,
    /// Number of tool calls in that response
    pub total_calls_in_response: usize,
    /// Raw JSON arguments as returned by the provider
    #[serde(default)]
    pub arguments: String,
}

/// Payload of an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    Action(Action),
    Observation(Observation),
}

/// A history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Sequence position, unique within a history
    pub id: EventId,

    /// When the event was appended
    pub timestamp: DateTime<Utc>,

    /// Producer of the event
    pub source: EventSource,

    /// Event that caused this one (observations point at their action)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<EventId>,

    /// Action or observation
    pub payload: EventPayload,
}

impl Event {
    /// Create an action event
    pub fn action(id: u64, source: EventSource, action: Action) -> Self {
        Self {
            id: EventId(id),
            timestamp: Utc::now(),
            source,
            cause: None,
            payload: EventPayload::Action(action),
        }
    }

    /// Create an observation event caused by the action with id `cause`
    pub fn observation(id: u64, cause: Option<u64>, observation: Observation) -> Self {
        Self {
            id: EventId(id),
            timestamp: Utc::now(),
            source: EventSource::Environment,
            cause: cause.map(EventId),
            payload: EventPayload::Observation(observation),
        }
    }

    /// Create a user message event
    pub fn user_message(id: u64, content: impl Into<String>) -> Self {
        Self::action(id, EventSource::User, Action::message(content))
    }

    /// Get the action if this is an action event
    pub fn as_action(&self) -> Option<&Action> {
        match &self.payload {
            EventPayload::Action(action) => Some(action),
            EventPayload::Observation(_) => None,
        }
    }

    /// Get the observation if this is an observation event
    pub fn as_observation(&self) -> Option<&Observation> {
        match &self.payload {
            EventPayload::Observation(observation) => Some(observation),
            EventPayload::Action(_) => None,
        }
    }

    /// Get the message if this is a message action (from any source)
    pub fn as_message(&self) -> Option<&MessageAction> {
        match self.as_action().map(|a| &a.kind) {
            Some(ActionKind::Message(message)) => Some(message),
            _ => None,
        }
    }

    /// Get the message if this is a message action sent by the user
    pub fn as_user_message(&self) -> Option<&MessageAction> {
        if self.source == EventSource::User {
            self.as_message()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::ObservationKind;

    #[test]
    fn test_user_message_event() {
        let event = Event::user_message(1, "train a model");
        assert_eq!(event.source, EventSource::User);
        assert_eq!(
            event.as_user_message().map(|m| m.content.as_str()),
            Some("train a model")
        );
        assert!(event.as_observation().is_none());
    }

    #[test]
    fn test_agent_message_is_not_user_message() {
        let event = Event::action(2, EventSource::Agent, Action::message("done"));
        assert!(event.as_message().is_some());
        assert!(event.as_user_message().is_none());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::observation(
            3,
            Some(2),
            Observation::new(
                ObservationKind::CmdOutput {
                    command: "ls".to_string(),
                    exit_code: 0,
                },
                "data.csv",
            ),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["cause"], 2);
        assert_eq!(json["source"], "environment");
        assert_eq!(json["payload"]["type"], "observation");
        assert_eq!(json["payload"]["data"]["observation"], "cmd_output");

        let parsed: Event = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }
}
