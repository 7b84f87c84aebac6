//! mrx-agent: Study-intake conversation runtime
//!
//! This crate drives the scripted market-research intake dialogue: a state
//! machine over [`SessionState`], LLM-backed extraction and brief drafting,
//! and a turn orchestrator that commits or rolls back whole turns.

pub mod brief;
pub mod error;
pub mod events;
pub mod extraction;
pub mod history;
pub mod json;
pub mod machine;
pub mod orchestrator;
pub mod prompts;
pub mod services;
pub mod session;
pub mod transport;

pub use brief::BriefOutcome;
pub use error::{Error, Result};
pub use events::{AgentEvent, TurnEvent};
pub use extraction::Extraction;
pub use machine::{MachineConfig, StateMachine, Step, Transition};
pub use orchestrator::{OrchestratorConfig, TurnOrchestrator};
pub use services::{LlmServices, ServiceConfig};
pub use session::{
    HistoryEntry, OptionPayload, OptionType, Role, SessionState, Status, StudyBrief,
};
pub use transport::{ProviderTransport, RetryConfig, Transport};
