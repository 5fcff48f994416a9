// Response translation
//
// Maps a completion response to the actions the agent will emit, one action
// per tool call in response order. Every action derived from a tool call
// carries ToolCallMetadata so the memory builder can rebuild the assistant
// turn and pair the observation with its call later.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::action::{
    Action, ActionKind, AgentFinishAction, BrowseInteractiveAction, BrowseUrlAction, CmdRunAction,
    FileEdit, FileEditAction, FileReadAction, IPythonRunCellAction, McpAction, MessageAction,
    TaskCompletion,
};
use crate::error::TranslationError;
use crate::event::ToolCallMetadata;
use crate::llm::CompletionResponse;
use crate::tool_types::ToolCall;
use crate::tools::{
    BROWSER, EDIT_FILE, EXECUTE_BASH, EXECUTE_IPYTHON_CELL, FINISH, STR_REPLACE_EDITOR, THINK,
    WEB_READ,
};

type Args = Map<String, Value>;

/// Converts completion responses into actions
#[derive(Debug, Clone, Default)]
pub struct ResponseTranslator {
    known_tools: HashSet<String>,
    mcp_tools: HashSet<String>,
}

impl ResponseTranslator {
    /// Create a translator accepting the given built-in and MCP tool names
    pub fn new<K, M>(known_tools: K, mcp_tools: M) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            known_tools: known_tools.into_iter().map(Into::into).collect(),
            mcp_tools: mcp_tools.into_iter().map(Into::into).collect(),
        }
    }

    /// Translate a response into actions, in tool call order.
    ///
    /// Fails as a whole if any single tool call cannot be translated.
    pub fn translate(&self, response: &CompletionResponse) -> Result<Vec<Action>, TranslationError> {
        let content = response.content_text();

        if response.tool_calls.is_empty() {
            let Some(text) = content else {
                return Err(TranslationError::EmptyResponse);
            };
            return Ok(vec![Action::new(ActionKind::Message(MessageAction {
                content: text.to_string(),
                image_urls: Vec::new(),
                wait_for_response: true,
            }))]);
        }

        let total = response.tool_calls.len();
        let mut actions = Vec::with_capacity(total);
        for call in &response.tool_calls {
            let action = self.translate_call(call)?;
            actions.push(action.with_tool_call_metadata(ToolCallMetadata {
                function_name: call.name.clone(),
                tool_call_id: call.id.clone(),
                model_response_id: response.id.clone(),
                total_calls_in_response: total,
                arguments: call.arguments.clone(),
            }));
        }

        if let (Some(text), Some(first)) = (content, actions.first_mut()) {
            first.prepend_thought(text);
        }

        debug!(
            response_id = %response.id,
            actions = ?actions.iter().map(Action::name).collect::<Vec<_>>(),
            "Translated response to actions"
        );
        Ok(actions)
    }

    fn translate_call(&self, call: &ToolCall) -> Result<Action, TranslationError> {
        let is_known = self.known_tools.contains(&call.name);
        if !is_known && !self.mcp_tools.contains(&call.name) {
            return Err(TranslationError::UnknownTool {
                name: call.name.clone(),
            });
        }

        let args = parse_arguments(call)?;
        if !is_known {
            return Ok(Action::new(ActionKind::Mcp(McpAction {
                name: call.name.clone(),
                arguments: Value::Object(args),
            })));
        }

        let tool = call.name.as_str();
        let kind = match tool {
            EXECUTE_BASH => ActionKind::CmdRun(CmdRunAction {
                command: required_str(&args, tool, "command")?,
                is_input: optional_bool(&args, tool, "is_input")?.unwrap_or(false),
            }),
            EXECUTE_IPYTHON_CELL => ActionKind::IPythonRunCell(IPythonRunCellAction {
                code: required_str(&args, tool, "code")?,
            }),
            THINK => {
                return Ok(Action::think(required_str(&args, tool, "thought")?));
            }
            FINISH => ActionKind::Finish(AgentFinishAction {
                final_thought: required_str(&args, tool, "message")?,
                task_completed: optional_str(&args, tool, "task_completed")?
                    .and_then(|v| TaskCompletion::parse(&v)),
            }),
            WEB_READ => ActionKind::BrowseUrl(BrowseUrlAction {
                url: required_str(&args, tool, "url")?,
            }),
            BROWSER => ActionKind::BrowseInteractive(BrowseInteractiveAction {
                browser_actions: required_str(&args, tool, "code")?,
            }),
            EDIT_FILE => ActionKind::FileEdit(FileEditAction {
                path: required_str(&args, tool, "path")?,
                edit: FileEdit::Llm {
                    content: required_str(&args, tool, "content")?,
                    start: optional_int(&args, tool, "start")?.unwrap_or(1),
                    end: optional_int(&args, tool, "end")?.unwrap_or(-1),
                },
            }),
            STR_REPLACE_EDITOR => str_replace_editor_action(&args)?,
            _ => {
                // Registered but without a built-in mapping
                return Err(TranslationError::UnknownTool {
                    name: call.name.clone(),
                });
            }
        };
        Ok(Action::new(kind))
    }
}

fn str_replace_editor_action(args: &Args) -> Result<ActionKind, TranslationError> {
    let tool = STR_REPLACE_EDITOR;
    let command = required_str(args, tool, "command")?;
    let path = required_str(args, tool, "path")?;

    if command == "view" {
        let view_range = match args.get("view_range") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_view_range(value).ok_or_else(|| invalid(
                tool,
                "view_range must be a list of two integers",
            ))?),
        };
        return Ok(ActionKind::FileRead(FileReadAction { path, view_range }));
    }

    let edit = match command.as_str() {
        "create" => FileEdit::Create {
            file_text: required_str(args, tool, "file_text")?,
        },
        "str_replace" => FileEdit::StrReplace {
            old_str: required_str(args, tool, "old_str")?,
            new_str: optional_str(args, tool, "new_str")?.unwrap_or_default(),
        },
        "insert" => {
            let insert_line = optional_int(args, tool, "insert_line")?.ok_or_else(|| {
                TranslationError::MissingArgument {
                    tool: tool.to_string(),
                    argument: "insert_line".to_string(),
                }
            })?;
            FileEdit::Insert {
                insert_line: u64::try_from(insert_line)
                    .map_err(|_| invalid(tool, "insert_line must not be negative"))?,
                new_str: required_str(args, tool, "new_str")?,
            }
        }
        "undo_edit" => FileEdit::UndoEdit,
        other => return Err(invalid(tool, &format!("unknown command '{}'", other))),
    };
    Ok(ActionKind::FileEdit(FileEditAction { path, edit }))
}

// ============================================================================
// Argument helpers
// ============================================================================

fn parse_arguments(call: &ToolCall) -> Result<Args, TranslationError> {
    if call.arguments.trim().is_empty() {
        return Ok(Args::new());
    }
    match serde_json::from_str::<Value>(&call.arguments) {
        Ok(Value::Object(args)) => Ok(args),
        Ok(other) => Err(invalid(
            &call.name,
            &format!("expected a JSON object, got {}", other),
        )),
        Err(e) => Err(invalid(&call.name, &e.to_string())),
    }
}

fn invalid(tool: &str, reason: &str) -> TranslationError {
    TranslationError::InvalidArguments {
        tool: tool.to_string(),
        reason: reason.to_string(),
    }
}

fn optional_str(args: &Args, tool: &str, key: &str) -> Result<Option<String>, TranslationError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(invalid(tool, &format!("'{}' must be a string", key))),
    }
}

fn required_str(args: &Args, tool: &str, key: &str) -> Result<String, TranslationError> {
    optional_str(args, tool, key)?.ok_or_else(|| TranslationError::MissingArgument {
        tool: tool.to_string(),
        argument: key.to_string(),
    })
}

fn optional_bool(args: &Args, tool: &str, key: &str) -> Result<Option<bool>, TranslationError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.to_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(invalid(tool, &format!("'{}' must be true or false", key))),
        },
        Some(_) => Err(invalid(tool, &format!("'{}' must be a boolean", key))),
    }
}

fn optional_int(args: &Args, tool: &str, key: &str) -> Result<Option<i64>, TranslationError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(tool, &format!("'{}' must be an integer", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(tool, &format!("'{}' must be an integer", key))),
        Some(_) => Err(invalid(tool, &format!("'{}' must be an integer", key))),
    }
}

fn parse_view_range(value: &Value) -> Option<[i64; 2]> {
    match value.as_array()?.as_slice() {
        [start, end] => Some([start.as_i64()?, end.as_i64()?]),
        _ => None,
    }
}
