//! Conversation state store
//!
//! A single state value mutated only through the closed set of transitions
//! in [`Action`], applied by the pure [`reduce`] function. The orchestrator
//! is the only legitimate dispatcher; this isolation keeps the engine's
//! behavior testable independent of network timing.
//!
//! Messages are held as `Arc<Message>` and the list is append-only: every
//! transition produces a new vector, previously appended messages are never
//! rewritten, and a `Reset` is the only way to discard them.

use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use advisor_core::Message;

/// The conversation state consumed by the view layer
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Stable session identifier; regenerated only on `Reset`
    pub conversation_id: String,
    pub messages: Vec<Arc<Message>>,
    pub is_loading: bool,
    pub is_tool_executing: bool,
    pub active_tool_name: Option<String>,
    /// Last error description; cleared explicitly, never by a later success
    pub error: Option<String>,
    /// Accumulating context bag, shallow-merged on update
    pub active_context: Map<String, Value>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            conversation_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            is_loading: false,
            is_tool_executing: false,
            active_tool_name: None,
            error: None,
            active_context: Map::new(),
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// The closed set of state transitions
#[derive(Debug, Clone)]
pub enum Action {
    /// Start a user turn: sets the loading flag and clears any prior error
    BeginSend,
    AppendUserMessage(Arc<Message>),
    /// Append an engine-produced message (model or tool-log) and clear the
    /// loading flag
    AppendModelMessage(Arc<Message>),
    /// Record an error and clear both activity flags; an error always
    /// terminates any in-flight activity indication
    SetError(String),
    ClearError,
    BeginTool(String),
    EndTool,
    /// Shallow-merge into the active context
    MergeContext(Map<String, Value>),
    /// Discard all messages and context and mint a fresh conversation id
    Reset,
}

/// Pure transition function
pub fn reduce(state: &ConversationState, action: Action) -> ConversationState {
    let mut next = state.clone();
    match action {
        Action::BeginSend => {
            next.is_loading = true;
            next.error = None;
        }
        Action::AppendUserMessage(msg) => {
            next.messages.push(msg);
        }
        Action::AppendModelMessage(msg) => {
            next.messages.push(msg);
            next.is_loading = false;
        }
        Action::SetError(text) => {
            next.error = Some(text);
            next.is_loading = false;
            next.is_tool_executing = false;
            next.active_tool_name = None;
        }
        Action::ClearError => {
            next.error = None;
        }
        Action::BeginTool(name) => {
            next.is_tool_executing = true;
            next.active_tool_name = Some(name);
        }
        Action::EndTool => {
            next.is_tool_executing = false;
            next.active_tool_name = None;
        }
        Action::MergeContext(partial) => {
            for (key, value) in partial {
                next.active_context.insert(key, value);
            }
        }
        Action::Reset => {
            next = ConversationState::new();
        }
    }
    next
}
