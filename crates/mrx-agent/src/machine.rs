//! Conversation state machine
//!
//! Advances a [`SessionState`] by one user input: decides the next stage,
//! sets the templated agent message and attaches any option payload. The
//! machine never retains the state it is given.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    brief::{self, BriefOutcome},
    error::Result,
    events::TurnEvent,
    extraction,
    services::LlmServices,
    session::{OptionPayload, SessionState, Status},
};

pub const HAVE_BRIEF: &str = "I already have a brief";
pub const NEED_BRIEF: &str = "I need help creating a brief";

pub const STUDY_TYPES: [&str; 9] = [
    "Brand Health / Equity",
    "New Product / Concept Test",
    "Pricing & Value Perception",
    "Usage & Attitude",
    "Segmentation / Persona Deep-dive",
    "Sustainability / CSR Perception",
    "Customer Journey / Pain-points",
    "Re-positioning / Comms Test",
    "Others",
];

pub const BRIEF_CHOICE_MESSAGE: &str =
    "Do you already have a study brief, or would you like help creating one?";
pub const UPLOAD_MESSAGE: &str = "Please upload the study brief.";
pub const UPLOAD_PLACEHOLDER_MESSAGE: &str = "Upload process under construction.";
pub const STUDY_TYPE_MESSAGE: &str = "Let me know what type of study you want to conduct. \
You can select from the options below or type your own.";
pub const OBJECTIVE_MESSAGE: &str = "Please state your research objective.";
pub const RESTATE_OBJECTIVE_MESSAGE: &str = "I couldn't make out the company or product in that objective. \
Could you restate your research objective?";
pub const COMPANY_MESSAGE: &str = "For which company are we running this study?";
pub const REVIEW_MESSAGE: &str =
    "Take a look at the challenges and opportunities and modify them if needed.";
pub const BRIEF_FAILED_MESSAGE: &str =
    "Generating the challenges and opportunities failed. Please try again later.";
pub const COMPLETE_MESSAGE: &str = "Process is completed.";

/// Machine behaviour that can vary per deployment
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Company to use regardless of what extraction finds
    pub client_company: Option<String>,
    /// Upper bound on brief service calls per generation
    pub max_brief_attempts: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            client_company: None,
            max_brief_attempts: brief::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// What one step did to the dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A scripted transition fired (the stage may or may not have changed)
    Advanced { from: Status, to: Status },
    /// The input was not usable; the same question was asked again
    Reprompted { status: Status },
    /// No transition is scripted for this stage; the catch-all completed the session
    FellThrough { from: Status },
}

/// The state returned by a step plus what happened
#[derive(Debug, Clone)]
pub struct Step {
    pub state: SessionState,
    pub transition: Transition,
}

enum Flow {
    Moved,
    Repeated,
    FellThrough,
}

/// The scripted study-design dialogue
pub struct StateMachine {
    services: Arc<LlmServices>,
    config: MachineConfig,
    events: Option<broadcast::Sender<TurnEvent>>,
}

impl StateMachine {
    pub fn new(services: Arc<LlmServices>, config: MachineConfig) -> Self {
        Self {
            services,
            config,
            events: None,
        }
    }

    /// Report brief attempts on the given channel
    pub fn with_events(mut self, events: broadcast::Sender<TurnEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Advance the dialogue by one input.
    ///
    /// Errors from the services (transport failures, timeouts) abort the step;
    /// the caller still holds whatever state it cloned beforehand.
    pub async fn step(&self, mut state: SessionState, input: &str) -> Result<Step> {
        let from = state.status;
        let input = input.trim();

        let flow = match from {
            Status::Start => {
                ask_brief_choice(&mut state);
                Flow::Moved
            }
            Status::AwaitingBriefChoice => match input {
                HAVE_BRIEF => {
                    state.status = Status::AwaitingBriefUpload;
                    state.agent_message = UPLOAD_MESSAGE.to_string();
                    Flow::Moved
                }
                NEED_BRIEF => {
                    state.status = Status::AwaitingStudyType;
                    state.agent_message = STUDY_TYPE_MESSAGE.to_string();
                    state.options = OptionPayload::choices_with_free_text(STUDY_TYPES);
                    Flow::Moved
                }
                other => {
                    tracing::debug!(input = %other, "Unrecognized brief choice, asking again");
                    ask_brief_choice(&mut state);
                    Flow::Repeated
                }
            },
            Status::AwaitingBriefUpload => {
                state.status = Status::Complete;
                state.agent_message = UPLOAD_PLACEHOLDER_MESSAGE.to_string();
                Flow::Moved
            }
            Status::AwaitingStudyType => {
                state.study_type = Some(input.to_string());
                state.status = Status::AwaitingResearchObjective;
                state.agent_message = OBJECTIVE_MESSAGE.to_string();
                Flow::Moved
            }
            Status::AwaitingResearchObjective => self.take_objective(&mut state, input).await?,
            Status::AwaitingCompanyName => {
                if input.is_empty() {
                    state.agent_message = COMPANY_MESSAGE.to_string();
                    Flow::Repeated
                } else {
                    state.company = Some(input.to_string());
                    self.build_brief(&mut state).await?;
                    Flow::Moved
                }
            }
            Status::ConfirmChallengesOpportunities | Status::Complete | Status::Failure => {
                tracing::warn!(from = %from, "No transition scripted, completing session");
                state.status = Status::Complete;
                state.agent_message = COMPLETE_MESSAGE.to_string();
                Flow::FellThrough
            }
        };

        let transition = match flow {
            Flow::Moved => Transition::Advanced {
                from,
                to: state.status,
            },
            Flow::Repeated => Transition::Reprompted {
                status: state.status,
            },
            Flow::FellThrough => Transition::FellThrough { from },
        };
        tracing::debug!(?transition, "Step finished");

        Ok(Step { state, transition })
    }

    async fn take_objective(&self, state: &mut SessionState, input: &str) -> Result<Flow> {
        let Some(found) = extraction::extract(&self.services, input).await? else {
            state.agent_message = RESTATE_OBJECTIVE_MESSAGE.to_string();
            return Ok(Flow::Repeated);
        };

        state.research_objective = Some(input.to_string());
        state.product = found.product().map(str::to_string);
        state.company = self
            .config
            .client_company
            .clone()
            .or_else(|| found.company().map(str::to_string));

        if state.company.is_none() {
            state.status = Status::AwaitingCompanyName;
            state.agent_message = COMPANY_MESSAGE.to_string();
        } else {
            self.build_brief(state).await?;
        }
        Ok(Flow::Moved)
    }

    async fn build_brief(&self, state: &mut SessionState) -> Result<()> {
        let objective = state.research_objective.clone().unwrap_or_default();
        let company = state.company.clone().unwrap_or_default();

        let outcome = brief::generate_brief(
            &self.services,
            &objective,
            &company,
            self.config.max_brief_attempts,
            |attempt, accepted| {
                if let Some(ref events) = self.events {
                    let _ = events.send(TurnEvent::BriefAttempt { attempt, accepted });
                }
            },
        )
        .await?;

        match outcome {
            BriefOutcome::Ready { brief, .. } => {
                state.status = Status::ConfirmChallengesOpportunities;
                state.agent_message = REVIEW_MESSAGE.to_string();
                state.options = OptionPayload::editable_text(brief.to_text_block());
                state.study_brief = Some(brief);
            }
            BriefOutcome::Exhausted { attempts } => {
                tracing::warn!(attempts, "Brief generation exhausted its attempts");
                state.status = Status::Failure;
                state.agent_message = BRIEF_FAILED_MESSAGE.to_string();
            }
        }
        Ok(())
    }
}

fn ask_brief_choice(state: &mut SessionState) {
    state.status = Status::AwaitingBriefChoice;
    state.agent_message = BRIEF_CHOICE_MESSAGE.to_string();
    state.options = OptionPayload::choices([HAVE_BRIEF, NEED_BRIEF]);
}
