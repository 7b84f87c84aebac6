//! Session state: dialogue stage, history, option payload and captured facts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Stage of the scripted dialogue. Drives all branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Start,
    AwaitingBriefChoice,
    AwaitingBriefUpload,
    AwaitingStudyType,
    AwaitingResearchObjective,
    AwaitingCompanyName,
    ConfirmChallengesOpportunities,
    Complete,
    Failure,
}

impl Status {
    pub const ALL: [Status; 9] = [
        Status::Start,
        Status::AwaitingBriefChoice,
        Status::AwaitingBriefUpload,
        Status::AwaitingStudyType,
        Status::AwaitingResearchObjective,
        Status::AwaitingCompanyName,
        Status::ConfirmChallengesOpportunities,
        Status::Complete,
        Status::Failure,
    ];

    /// Get the wire name for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Start => "start",
            Status::AwaitingBriefChoice => "awaiting_brief_choice",
            Status::AwaitingBriefUpload => "awaiting_brief_upload",
            Status::AwaitingStudyType => "awaiting_study_type",
            Status::AwaitingResearchObjective => "awaiting_research_objective",
            Status::AwaitingCompanyName => "awaiting_company_name",
            Status::ConfirmChallengesOpportunities => "confirm_challenges_opportunities",
            Status::Complete => "complete",
            Status::Failure => "failure",
        }
    }

    /// Whether the session has reached a dead end
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Complete | Status::Failure)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// Who authored a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub message: String,
}

impl HistoryEntry {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            message: message.into(),
        }
    }

    pub fn agent(message: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            message: message.into(),
        }
    }
}

/// How the presentation layer should render an option payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionType {
    SingleSelect,
    SingleSelectFreeText,
    PlainText,
    PlainTextModify,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::SingleSelect => "single-select",
            OptionType::SingleSelectFreeText => "single-select-free-text",
            OptionType::PlainText => "plain-text",
            OptionType::PlainTextModify => "plain-text-modify",
        }
    }
}

/// UI hint attached to an outgoing message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptionPayload {
    #[default]
    None,
    /// Selectable labels, optionally alongside a free-text box
    Choices {
        items: Vec<String>,
        allow_free_text: bool,
    },
    /// A block of text appended to the message; editable blocks become a prefill
    Text { body: String, editable: bool },
}

impl OptionPayload {
    pub fn choices<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choices {
            items: items.into_iter().map(Into::into).collect(),
            allow_free_text: false,
        }
    }

    pub fn choices_with_free_text<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choices {
            items: items.into_iter().map(Into::into).collect(),
            allow_free_text: true,
        }
    }

    pub fn editable_text(body: impl Into<String>) -> Self {
        Self::Text {
            body: body.into(),
            editable: true,
        }
    }

    pub fn plain_text(body: impl Into<String>) -> Self {
        Self::Text {
            body: body.into(),
            editable: false,
        }
    }

    /// The option type tag for this payload, `None` when empty
    pub fn option_type(&self) -> Option<OptionType> {
        match self {
            OptionPayload::None => None,
            OptionPayload::Choices {
                allow_free_text: false,
                ..
            } => Some(OptionType::SingleSelect),
            OptionPayload::Choices {
                allow_free_text: true,
                ..
            } => Some(OptionType::SingleSelectFreeText),
            OptionPayload::Text {
                editable: false, ..
            } => Some(OptionType::PlainText),
            OptionPayload::Text { editable: true, .. } => Some(OptionType::PlainTextModify),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, OptionPayload::None)
    }

    pub fn clear(&mut self) {
        *self = OptionPayload::None;
    }
}

/// Objective summary plus challenge and opportunity lists, always set together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyBrief {
    pub objective: String,
    pub challenges: Vec<String>,
    pub opportunities: Vec<String>,
}

impl StudyBrief {
    /// Render as the editable block shown to the user
    pub fn to_text_block(&self) -> String {
        format!(
            "{}\nChallenges:\n{}\nOpportunities:\n{}",
            self.objective,
            self.challenges.join("\n"),
            self.opportunities.join("\n")
        )
    }
}

/// Everything tracked for one user's conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub status: Status,
    pub conversation_history: Vec<HistoryEntry>,
    /// Last templated (pre-polish) message
    pub agent_message: String,
    #[serde(default)]
    pub options: OptionPayload,
    pub study_type: Option<String>,
    pub research_objective: Option<String>,
    pub company: Option<String>,
    pub product: Option<String>,
    pub study_brief: Option<StudyBrief>,
}

impl SessionState {
    /// Create a fresh session at the start of the dialogue
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: Status::Start,
            conversation_history: Vec::new(),
            agent_message: String::new(),
            options: OptionPayload::None,
            study_type: None,
            research_objective: None,
            company: None,
            product: None,
            study_brief: None,
        }
    }

    pub fn option_type(&self) -> Option<OptionType> {
        self.options.option_type()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        let err = "awaiting_lunch".parse::<Status>().unwrap_err();
        assert!(matches!(err, Error::UnknownStatus(ref s) if s == "awaiting_lunch"));
    }

    #[test]
    fn test_deserialize_rejects_unknown_status() {
        let mut value = serde_json::to_value(SessionState::new()).unwrap();
        value["status"] = serde_json::json!("exploded");
        assert!(serde_json::from_value::<SessionState>(value).is_err());
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        for status in Status::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::json!(status.as_str()));
        }
    }

    #[test]
    fn test_new_session_starts_empty() {
        let state = SessionState::new();
        assert_eq!(state.status, Status::Start);
        assert!(state.conversation_history.is_empty());
        assert!(state.options.is_none());
        assert_eq!(state.option_type(), None);
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        assert_ne!(SessionState::new().id, SessionState::new().id);
    }

    #[test]
    fn test_option_type_derived_from_payload() {
        assert_eq!(
            OptionPayload::choices(["a", "b"]).option_type(),
            Some(OptionType::SingleSelect)
        );
        assert_eq!(
            OptionPayload::choices_with_free_text(["a"]).option_type(),
            Some(OptionType::SingleSelectFreeText)
        );
        assert_eq!(
            OptionPayload::plain_text("x").option_type(),
            Some(OptionType::PlainText)
        );
        assert_eq!(
            OptionPayload::editable_text("x").option_type(),
            Some(OptionType::PlainTextModify)
        );
        assert_eq!(OptionType::PlainTextModify.as_str(), "plain-text-modify");
    }

    #[test]
    fn test_brief_text_block() {
        let brief = StudyBrief {
            objective: "Understand churn.".into(),
            challenges: vec!["Price".into(), "Support".into()],
            opportunities: vec!["Bundles".into()],
        };
        assert_eq!(
            brief.to_text_block(),
            "Understand churn.\nChallenges:\nPrice\nSupport\nOpportunities:\nBundles"
        );
    }
}
