//! Agent event types

use mrx_ai::{Message, Usage};
use serde::{Deserialize, Serialize};

use crate::session::Status;

/// Events emitted by a transport while running one generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Message streaming started
    MessageStart { message: Message },

    /// Message content updated during streaming
    MessageUpdate { text: String },

    /// Message completed
    MessageEnd { message: Message, usage: Usage },

    /// Error occurred
    Error { message: String },
}

impl AgentEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::MessageEnd { .. } | AgentEvent::Error { .. })
    }
}

/// Events broadcast by the turn orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A turn started processing user input
    TurnStart { status: Status },

    /// The state machine moved between stages
    Transition { from: Status, to: Status },

    /// The state machine asked the same question again
    Reprompt { status: Status },

    /// No scripted transition existed; the catch-all arm completed the session
    FellThrough { from: Status },

    /// One brief generation attempt finished
    BriefAttempt { attempt: u32, accepted: bool },

    /// The turn finished and state was committed
    TurnEnd { status: Status, history_len: usize },

    /// The turn was abandoned and state left untouched
    TurnFailed { status: Status, error: String },
}
