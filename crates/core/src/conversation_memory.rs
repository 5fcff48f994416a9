// Conversation memory
//
// Turns the condensed event view into the ordered message list sent to the
// model. The output always starts with exactly one system message, keeps the
// initial user message even if the condenser dropped it, and pairs every
// assistant tool call with exactly one tool result.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::action::{Action, ActionKind, FileEdit, MessageAction};
use crate::error::{AgentError, Result};
use crate::event::{Event, EventId, EventPayload, EventSource};
use crate::message::{ContentPart, Message, Role};
use crate::observation::Observation;
use crate::prompt::PromptManager;
use crate::tool_types::ToolCall;

/// Tool result used for calls that never got an observation
pub const CANCELLED_TOOL_RESULT: &str =
    "cancelled - another message came in before it could be completed";

/// Marker placed between the kept head and tail of a truncated text
pub const TRUNCATION_MARKER: &str = "\n[... Observation truncated due to length ...]\n";

/// Text used in place of an image when the model cannot see images
pub const IMAGE_PLACEHOLDER: &str = "[Image omitted: vision is not enabled for this model]";

/// Builds completion messages from events
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    prompt_manager: PromptManager,
}

/// Tool calls of one completion response, collected until complete
struct PendingResponse {
    response_id: String,
    thought: String,
    calls: Vec<ToolCall>,
    total: usize,
    /// A later response started, so no more calls of this one are in view
    closed: bool,
}

impl PendingResponse {
    fn is_complete(&self) -> bool {
        self.closed || self.calls.len() == self.total
    }

    fn contains(&self, tool_call_id: &str) -> bool {
        self.calls.iter().any(|c| c.id == tool_call_id)
    }
}

struct MessageBuilder {
    messages: Vec<Message>,
    pending: Vec<PendingResponse>,
    results: HashMap<String, Message>,
    vision_is_active: bool,
}

impl ConversationMemory {
    pub fn new(prompt_manager: PromptManager) -> Self {
        Self { prompt_manager }
    }

    pub fn prompt_manager(&self) -> &PromptManager {
        &self.prompt_manager
    }

    /// Convert the condensed events into messages.
    ///
    /// `initial_user` is the first user message of the full history, with its
    /// event id. It is re-inserted after the system message when the view no
    /// longer contains it.
    pub fn process_events(
        &self,
        condensed: &[Event],
        initial_user: Option<(EventId, &MessageAction)>,
        max_message_chars: usize,
        vision_is_active: bool,
    ) -> Result<Vec<Message>> {
        let system_text = self.system_text(condensed);
        let mut builder = MessageBuilder {
            messages: vec![Message::system(system_text)],
            pending: Vec::new(),
            results: HashMap::new(),
            vision_is_active,
        };

        if let Some((id, message)) = initial_user {
            if !condensed.iter().any(|e| e.id == id) {
                debug!(event_id = %id, "Re-inserting initial user message dropped by condenser");
                builder.push_user_message(message);
            }
        }

        let mut seen_system = false;
        for event in condensed {
            match &event.payload {
                EventPayload::Action(action) => {
                    if let ActionKind::System(_) = action.kind {
                        if seen_system {
                            warn!(event_id = %event.id, "Dropping extra system message");
                        }
                        seen_system = true;
                        continue;
                    }
                    builder.push_action(event, action)?;
                }
                EventPayload::Observation(observation) => {
                    builder.push_observation(event.id, observation);
                }
            }
        }
        builder.flush_all();

        let mut messages = merge_consecutive(builder.messages);
        for message in messages.iter_mut().filter(|m| m.role != Role::System) {
            truncate_message(message, max_message_chars);
        }

        debug!(
            event_count = condensed.len(),
            message_count = messages.len(),
            "Built messages from events"
        );
        Ok(messages)
    }

    /// Mark the system message and the last user or tool message for
    /// provider prompt caching. All other marks are cleared.
    pub fn apply_prompt_caching(&self, messages: &mut [Message]) {
        for message in messages.iter_mut() {
            message.cache_prompt = false;
        }
        if let Some(first) = messages.first_mut() {
            if first.role == Role::System {
                first.cache_prompt = true;
            }
        }
        if let Some(last) = messages
            .iter_mut()
            .rev()
            .find(|m| matches!(m.role, Role::User | Role::Tool))
        {
            last.cache_prompt = true;
        }
    }

    fn system_text(&self, condensed: &[Event]) -> String {
        condensed
            .iter()
            .filter_map(Event::as_action)
            .find_map(|a| match &a.kind {
                ActionKind::System(system) => Some(system.content.clone()),
                _ => None,
            })
            .unwrap_or_else(|| self.prompt_manager.system_message().to_string())
    }
}

impl MessageBuilder {
    fn push_action(&mut self, event: &Event, action: &Action) -> Result<()> {
        if let ActionKind::Condensation(_) = action.kind {
            return Ok(());
        }

        if let Some(metadata) = &action.tool_call_metadata {
            if metadata.total_calls_in_response == 0 {
                return Err(AgentError::memory(format!(
                    "event {} has tool call metadata with zero calls in response",
                    event.id
                )));
            }

            let call = ToolCall::new(
                metadata.tool_call_id.clone(),
                metadata.function_name.clone(),
                metadata.arguments.clone(),
            );
            let existing = self
                .pending
                .iter()
                .position(|p| p.response_id == metadata.model_response_id);
            match existing {
                Some(index) => self.pending[index].calls.push(call),
                None => {
                    // Calls of one response are contiguous in history; any
                    // still missing from an earlier response were condensed
                    for earlier in self.pending.iter_mut() {
                        earlier.closed = true;
                    }
                    self.flush_ready();
                    self.pending.push(PendingResponse {
                        response_id: metadata.model_response_id.clone(),
                        thought: action.thought.clone(),
                        calls: vec![call],
                        total: metadata.total_calls_in_response,
                        closed: false,
                    });
                }
            }
            return Ok(());
        }

        // A new turn closes any tool calls still waiting for results
        self.flush_all();

        match (&action.kind, event.source) {
            (ActionKind::Message(message), EventSource::User) => self.push_user_message(message),
            (_, EventSource::User) => {
                if let Some(text) = action_text(action) {
                    self.messages.push(Message::user(text));
                }
            }
            _ => {
                if let Some(text) = action_text(action) {
                    self.messages.push(Message::assistant(text));
                }
            }
        }
        Ok(())
    }

    fn push_observation(&mut self, id: EventId, observation: &Observation) {
        let parts = self.observation_parts(observation);

        let Some(metadata) = &observation.tool_call_metadata else {
            self.flush_all();
            self.messages.push(Message::user_parts(parts));
            return;
        };

        if !self.pending.iter().any(|p| p.contains(&metadata.tool_call_id)) {
            warn!(
                event_id = %id,
                tool_call_id = %metadata.tool_call_id,
                "Dropping tool result without a matching tool call in view"
            );
            return;
        }

        self.results.insert(
            metadata.tool_call_id.clone(),
            Message::tool_result(&metadata.tool_call_id, &metadata.function_name, parts),
        );
        self.flush_ready();
    }

    fn push_user_message(&mut self, message: &MessageAction) {
        let mut parts = vec![ContentPart::text(&message.content)];
        parts.extend(self.image_parts(message.image_urls.iter().map(String::as_str)));
        self.messages.push(Message::user_parts(parts));
    }

    /// Emit, oldest first, responses whose calls all have results.
    ///
    /// Stops at the first response that is still waiting so output stays in
    /// history order.
    fn flush_ready(&mut self) {
        let ready = self
            .pending
            .iter()
            .take_while(|p| {
                p.is_complete() && p.calls.iter().all(|c| self.results.contains_key(&c.id))
            })
            .count();
        let ready: Vec<PendingResponse> = self.pending.drain(..ready).collect();
        for response in ready {
            self.emit(response);
        }
    }

    /// Emit every pending response, cancelling calls without results
    fn flush_all(&mut self) {
        for response in std::mem::take(&mut self.pending) {
            self.emit(response);
        }
    }

    fn emit(&mut self, response: PendingResponse) {
        let call_ids: Vec<(String, String)> = response
            .calls
            .iter()
            .map(|c| (c.id.clone(), c.name.clone()))
            .collect();
        self.messages.push(Message::assistant_with_tool_calls(
            response.thought,
            response.calls,
        ));

        for (id, name) in call_ids {
            match self.results.remove(&id) {
                Some(result) => self.messages.push(result),
                None => {
                    warn!(
                        tool_call_id = %id,
                        model_response_id = %response.response_id,
                        "Tool call has no result, adding cancelled result"
                    );
                    self.messages.push(Message::tool_result(
                        id,
                        name,
                        vec![ContentPart::text(CANCELLED_TOOL_RESULT)],
                    ));
                }
            }
        }
    }

    fn observation_parts(&self, observation: &Observation) -> Vec<ContentPart> {
        let mut parts = vec![ContentPart::text(observation.to_llm_text())];
        parts.extend(self.image_parts(observation.image_urls()));
        parts
    }

    fn image_parts<'a>(&self, urls: impl IntoIterator<Item = &'a str>) -> Vec<ContentPart> {
        urls.into_iter()
            .map(|url| {
                if self.vision_is_active {
                    ContentPart::image(url)
                } else {
                    ContentPart::text(IMAGE_PLACEHOLDER)
                }
            })
            .collect()
    }
}

/// Text for an action that did not come from a tool call
fn action_text(action: &Action) -> Option<String> {
    let body = match &action.kind {
        ActionKind::Message(message) => message.content.clone(),
        ActionKind::Finish(finish) => finish.final_thought.clone(),
        ActionKind::Think => String::new(),
        ActionKind::CmdRun(cmd) => format!("Running command: {}", cmd.command),
        ActionKind::IPythonRunCell(cell) => format!("Running Python code:\n{}", cell.code),
        ActionKind::FileRead(read) => format!("Reading file: {}", read.path),
        ActionKind::FileEdit(edit) => match &edit.edit {
            FileEdit::Create { .. } => format!("Creating file: {}", edit.path),
            FileEdit::UndoEdit => format!("Undoing last edit of: {}", edit.path),
            _ => format!("Editing file: {}", edit.path),
        },
        ActionKind::BrowseUrl(browse) => format!("Browsing: {}", browse.url),
        ActionKind::BrowseInteractive(browse) => {
            format!("Browser actions:\n{}", browse.browser_actions)
        }
        ActionKind::Delegate(delegate) => format!("Delegating to {}", delegate.agent),
        ActionKind::Mcp(mcp) => format!("Calling MCP tool: {}", mcp.name),
        ActionKind::System(_) | ActionKind::Condensation(_) => return None,
    };

    let text = match (action.thought.is_empty(), body.is_empty()) {
        (true, true) => return None,
        (false, true) => action.thought.clone(),
        (true, false) => body,
        (false, false) => format!("{}\n{}", action.thought, body),
    };
    Some(text)
}

/// Merge runs of user messages, and runs of assistant messages without
/// tool calls, into single messages
fn merge_consecutive(messages: Vec<Message>) -> Vec<Message> {
    let mut merged: Vec<Message> = Vec::with_capacity(messages.len());
    for message in messages {
        if let Some(last) = merged.last_mut() {
            let both_user = last.role == Role::User && message.role == Role::User;
            let both_plain_assistant = last.role == Role::Assistant
                && message.role == Role::Assistant
                && !last.has_tool_calls()
                && !message.has_tool_calls();
            if both_user || both_plain_assistant {
                last.content.extend(message.content);
                continue;
            }
        }
        merged.push(message);
    }
    merged
}

/// Limit the combined text of a message to `max_chars`.
///
/// When over the limit the text parts collapse into one truncated part,
/// followed by the message's images in their original order.
fn truncate_message(message: &mut Message, max_chars: usize) {
    let Some(truncated) = truncate_content(&message.text(), max_chars) else {
        return;
    };
    let images = std::mem::take(&mut message.content)
        .into_iter()
        .filter(ContentPart::is_image);
    message.content = std::iter::once(ContentPart::text(truncated))
        .chain(images)
        .collect();
}

/// Keep the first and last halves of a text longer than `max_chars`.
///
/// Returns `None` when the text fits.
pub fn truncate_content(text: &str, max_chars: usize) -> Option<String> {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        return None;
    }

    let half = max_chars / 2;
    let head: String = text.chars().take(half).collect();
    let tail: String = text.chars().skip(char_count - half).collect();
    Some(format!("{}{}{}", head, TRUNCATION_MARKER, tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ToolCallMetadata;
    use crate::observation::ObservationKind;

    const MAX: usize = 30_000;

    fn memory() -> ConversationMemory {
        ConversationMemory::new(PromptManager::new("You are an ML engineer."))
    }

    fn metadata(call_id: &str, name: &str, response_id: &str, total: usize) -> ToolCallMetadata {
        ToolCallMetadata {
            function_name: name.to_string(),
            tool_call_id: call_id.to_string(),
            model_response_id: response_id.to_string(),
            total_calls_in_response: total,
            arguments: "{}".to_string(),
        }
    }

    fn tool_action(id: u64, action: Action, meta: ToolCallMetadata) -> Event {
        Event::action(id, EventSource::Agent, action.with_tool_call_metadata(meta))
    }

    fn cmd_output(id: u64, cause: u64, output: &str, meta: ToolCallMetadata) -> Event {
        Event::observation(
            id,
            Some(cause),
            Observation::new(
                ObservationKind::CmdOutput {
                    command: "ls".to_string(),
                    exit_code: 0,
                },
                output,
            )
            .with_tool_call_metadata(meta),
        )
    }

    fn roles(messages: &[Message]) -> Vec<Role> {
        messages.iter().map(|m| m.role).collect()
    }

    #[test]
    fn test_system_message_synthesized() {
        let events = vec![Event::user_message(0, "hello")];
        let messages = memory().process_events(&events, None, MAX, true).unwrap();

        assert_eq!(roles(&messages), vec![Role::System, Role::User]);
        assert_eq!(messages[0].text(), "You are an ML engineer.");
    }

    #[test]
    fn test_existing_system_message_used_once() {
        let events = vec![
            Event::action(0, EventSource::Agent, Action::system("Custom prompt")),
            Event::user_message(1, "hello"),
            Event::action(2, EventSource::Agent, Action::system("Second prompt")),
        ];
        let messages = memory().process_events(&events, None, MAX, true).unwrap();

        assert_eq!(roles(&messages), vec![Role::System, Role::User]);
        assert_eq!(messages[0].text(), "Custom prompt");
    }

    #[test]
    fn test_initial_user_message_reinserted() {
        let initial = Event::user_message(1, "Build a churn model");
        let initial_message = initial.as_user_message().unwrap().clone();
        let events = vec![Event::action(5, EventSource::Agent, Action::message("Working on it"))];

        let messages = memory()
            .process_events(&events, Some((EventId(1), &initial_message)), MAX, true)
            .unwrap();

        assert_eq!(roles(&messages), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(messages[1].text(), "Build a churn model");
    }

    #[test]
    fn test_initial_user_message_not_duplicated() {
        let events = vec![Event::user_message(1, "Build a churn model")];
        let initial_message = events[0].as_user_message().unwrap().clone();

        let messages = memory()
            .process_events(&events, Some((EventId(1), &initial_message)), MAX, true)
            .unwrap();
        assert_eq!(roles(&messages), vec![Role::System, Role::User]);
    }

    #[test]
    fn test_parallel_tool_calls_grouped() {
        let events = vec![
            Event::user_message(0, "inspect the data"),
            tool_action(
                1,
                Action::cmd_run("ls").with_thought("Look around first"),
                metadata("call_1", "execute_bash", "resp_1", 2),
            ),
            tool_action(
                2,
                Action::cmd_run("head data.csv"),
                metadata("call_2", "execute_bash", "resp_1", 2),
            ),
            cmd_output(3, 1, "data.csv", metadata("call_1", "execute_bash", "resp_1", 2)),
            cmd_output(4, 2, "a,b,c", metadata("call_2", "execute_bash", "resp_1", 2)),
        ];

        let messages = memory().process_events(&events, None, MAX, true).unwrap();
        assert_eq!(
            roles(&messages),
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Tool]
        );
        assert_eq!(messages[2].text(), "Look around first");
        assert_eq!(messages[2].tool_calls.len(), 2);
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(messages[4].tool_call_id.as_deref(), Some("call_2"));
    }

    #[test]
    fn test_dangling_tool_call_gets_cancelled_result() {
        let events = vec![
            Event::user_message(0, "train it"),
            tool_action(
                1,
                Action::cmd_run("python train.py"),
                metadata("call_1", "execute_bash", "resp_1", 1),
            ),
            Event::user_message(2, "stop, use xgboost instead"),
        ];

        let messages = memory().process_events(&events, None, MAX, true).unwrap();
        assert_eq!(
            roles(&messages),
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::User]
        );
        assert_eq!(messages[3].text(), CANCELLED_TOOL_RESULT);
    }

    #[test]
    fn test_orphan_tool_result_dropped() {
        let events = vec![
            Event::user_message(0, "go"),
            cmd_output(3, 1, "forgotten output", metadata("call_9", "execute_bash", "resp_0", 1)),
        ];

        let messages = memory().process_events(&events, None, MAX, true).unwrap();
        assert_eq!(roles(&messages), vec![Role::System, Role::User]);
    }

    #[test]
    fn test_consecutive_messages_merged() {
        let events = vec![
            Event::user_message(0, "first"),
            Event::user_message(1, "second"),
            Event::action(2, EventSource::Agent, Action::message("a")),
            Event::action(3, EventSource::Agent, Action::message("b")),
        ];

        let messages = memory().process_events(&events, None, MAX, true).unwrap();
        assert_eq!(roles(&messages), vec![Role::System, Role::User, Role::Assistant]);
        assert_eq!(messages[1].text(), "first\nsecond");
        assert_eq!(messages[2].text(), "a\nb");
    }

    #[test]
    fn test_long_observation_truncated() {
        let long_output = format!("{}{}", "h".repeat(100), "t".repeat(100));
        let events = vec![
            Event::user_message(0, "run"),
            tool_action(1, Action::cmd_run("cat log"), metadata("c", "execute_bash", "r", 1)),
            cmd_output(2, 1, &long_output, metadata("c", "execute_bash", "r", 1)),
        ];

        let messages = memory().process_events(&events, None, 50, true).unwrap();
        let text = messages[3].text();
        assert!(text.starts_with(&"h".repeat(25)));
        assert!(text.contains(TRUNCATION_MARKER));
        assert!(text.ends_with("exit code 0]"));
    }

    #[test]
    fn test_partial_response_kept_in_history_order() {
        // call_a of resp_1 was condensed away
        let events = vec![
            Event::user_message(0, "tune the model"),
            tool_action(
                2,
                Action::cmd_run("python eval.py"),
                metadata("call_b", "execute_bash", "resp_1", 2),
            ),
            cmd_output(3, 2, "auc 0.81", metadata("call_b", "execute_bash", "resp_1", 2)),
            tool_action(
                4,
                Action::cmd_run("python tune.py"),
                metadata("call_c", "execute_bash", "resp_2", 1),
            ),
            cmd_output(5, 4, "best depth 6", metadata("call_c", "execute_bash", "resp_2", 1)),
        ];

        let messages = memory().process_events(&events, None, MAX, true).unwrap();
        assert_eq!(
            roles(&messages),
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::Tool,
                Role::Assistant,
                Role::Tool
            ]
        );
        assert_eq!(messages[2].tool_calls[0].id, "call_b");
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("call_b"));
        assert_eq!(messages[4].tool_calls[0].id, "call_c");
        assert_eq!(messages[5].tool_call_id.as_deref(), Some("call_c"));
    }

    #[test]
    fn test_condensed_result_does_not_reorder_later_response() {
        // The result of call_a was condensed away
        let events = vec![
            Event::user_message(0, "tune the model"),
            tool_action(
                1,
                Action::cmd_run("python eval.py"),
                metadata("call_a", "execute_bash", "resp_1", 1),
            ),
            tool_action(
                3,
                Action::cmd_run("python tune.py"),
                metadata("call_c", "execute_bash", "resp_2", 1),
            ),
            cmd_output(4, 3, "best depth 6", metadata("call_c", "execute_bash", "resp_2", 1)),
        ];

        let messages = memory().process_events(&events, None, MAX, true).unwrap();
        assert_eq!(messages[2].tool_calls[0].id, "call_a");
        assert_eq!(messages[3].text(), CANCELLED_TOOL_RESULT);
        assert_eq!(messages[4].tool_calls[0].id, "call_c");
        assert!(messages[5].text().starts_with("best depth 6"));
    }

    #[test]
    fn test_merged_messages_truncated_as_one() {
        let events = vec![
            Event::user_message(0, "a".repeat(80)),
            Event::user_message(1, "b".repeat(80)),
        ];

        let messages = memory().process_events(&events, None, 100, true).unwrap();
        assert_eq!(roles(&messages), vec![Role::System, Role::User]);

        let text = messages[1].text();
        assert!(text.contains(TRUNCATION_MARKER));
        assert!(text.starts_with(&"a".repeat(50)));
        assert!(text.ends_with(&"b".repeat(50)));
        assert_eq!(
            text.chars().count(),
            100 + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_truncate_content() {
        assert_eq!(truncate_content("short", 10), None);
        assert_eq!(
            truncate_content("abcdefghij", 4).unwrap(),
            format!("ab{}ij", TRUNCATION_MARKER)
        );
    }

    #[test]
    fn test_images_replaced_without_vision() {
        let plot = Observation::new(
            ObservationKind::IPythonRunCell {
                code: "plt.show()".to_string(),
                image_urls: vec!["data:image/png;base64,AAA".to_string()],
            },
            "<Figure>",
        );
        let events = vec![
            Event::user_message(0, "plot it"),
            Event::observation(1, None, plot),
        ];

        let with_vision = memory().process_events(&events, None, MAX, true).unwrap();
        assert!(with_vision.iter().any(Message::contains_image));

        let without_vision = memory().process_events(&events, None, MAX, false).unwrap();
        assert!(!without_vision.iter().any(Message::contains_image));
        assert!(without_vision[1].text().contains(IMAGE_PLACEHOLDER));
    }

    #[test]
    fn test_zero_call_metadata_is_error() {
        let events = vec![tool_action(
            0,
            Action::cmd_run("ls"),
            metadata("c", "execute_bash", "r", 0),
        )];
        let err = memory().process_events(&events, None, MAX, true).unwrap_err();
        assert!(matches!(err, AgentError::MemoryBuild(_)));
    }

    #[test]
    fn test_prompt_caching_marks() {
        let events = vec![
            Event::user_message(0, "first"),
            Event::action(1, EventSource::Agent, Action::message("ok")),
            Event::user_message(2, "second"),
            Event::action(3, EventSource::Agent, Action::message("done")),
        ];
        let memory = memory();
        let mut messages = memory.process_events(&events, None, MAX, true).unwrap();
        memory.apply_prompt_caching(&mut messages);

        let marked: Vec<usize> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.cache_prompt)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(marked, vec![0, 3]);
    }
}
