//! Turn orchestration
//!
//! One user input becomes one committed turn: the user entry is recorded, the
//! state machine advances, the agent message is optionally polished, and the
//! agent entry is recorded. A turn that fails part way leaves the caller's
//! state exactly as it was.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    error::{Error, Result},
    events::TurnEvent,
    history,
    machine::{MachineConfig, StateMachine, Step, Transition},
    services::LlmServices,
    session::{HistoryEntry, OptionPayload, SessionState},
};

pub const TIMEOUT_REPLY: &str =
    "Sorry, that took longer than expected. Please send your last message again.";
pub const ERROR_REPLY: &str =
    "Sorry, something went wrong while processing your message. Please try again.";

const EVENT_CAPACITY: usize = 64;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Rephrase templated agent messages through the dialogue service
    pub polish: bool,
    pub machine: MachineConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            polish: true,
            machine: MachineConfig::default(),
        }
    }
}

/// Runs complete turns against a caller-held [`SessionState`]
pub struct TurnOrchestrator {
    services: Arc<LlmServices>,
    machine: StateMachine,
    polish: bool,
    event_tx: broadcast::Sender<TurnEvent>,
}

impl TurnOrchestrator {
    pub fn new(services: Arc<LlmServices>, config: OrchestratorConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let machine =
            StateMachine::new(services.clone(), config.machine).with_events(event_tx.clone());
        Self {
            services,
            machine,
            polish: config.polish,
            event_tx,
        }
    }

    /// Subscribe to turn events
    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.event_tx.subscribe()
    }

    pub fn polish_enabled(&self) -> bool {
        self.polish
    }

    /// Process one user input, never failing.
    ///
    /// On error the original state comes back untouched together with an
    /// apology the caller can show instead of an agent reply.
    pub async fn process(&self, user_input: &str, state: SessionState) -> (String, SessionState) {
        let original = state.clone();
        match self.try_process(user_input, state).await {
            Ok(turn) => turn,
            Err(e) => {
                tracing::error!(error = %e, status = %original.status, "Turn failed");
                self.emit(TurnEvent::TurnFailed {
                    status: original.status,
                    error: e.to_string(),
                });
                (failure_reply(&e).to_string(), original)
            }
        }
    }

    /// Process one user input, surfacing errors.
    ///
    /// The input state is consumed; callers that need rollback keep a clone.
    pub async fn try_process(
        &self,
        user_input: &str,
        mut state: SessionState,
    ) -> Result<(String, SessionState)> {
        self.emit(TurnEvent::TurnStart {
            status: state.status,
        });

        state
            .conversation_history
            .push(HistoryEntry::user(user_input));
        state.options.clear();

        let Step {
            mut state,
            transition,
        } = self.machine.step(state, user_input).await?;
        self.emit(match transition {
            Transition::Advanced { from, to } => TurnEvent::Transition { from, to },
            Transition::Reprompted { status } => TurnEvent::Reprompt { status },
            Transition::FellThrough { from } => TurnEvent::FellThrough { from },
        });

        let agent_message = state.agent_message.trim().to_string();
        let mut reply = if self.polish {
            let rendered = history::render(&state.conversation_history);
            self.services.polish(rendered.trim(), &agent_message).await?
        } else {
            agent_message
        };

        let mut drop_options = false;
        if let OptionPayload::Text { body, editable } = &state.options {
            reply.push('\n');
            reply.push_str(body);
            drop_options = !editable;
        }
        if drop_options {
            state.options.clear();
        }

        state
            .conversation_history
            .push(HistoryEntry::agent(reply.clone()));

        self.emit(TurnEvent::TurnEnd {
            status: state.status,
            history_len: state.conversation_history.len(),
        });
        Ok((reply, state))
    }

    fn emit(&self, event: TurnEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

fn failure_reply(error: &Error) -> &'static str {
    if error.is_timeout() {
        TIMEOUT_REPLY
    } else {
        ERROR_REPLY
    }
}
