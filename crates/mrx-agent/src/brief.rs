//! Study brief generation with bounded retry.
//!
//! One service call per attempt. A response is accepted only when it parses
//! as a JSON object carrying all three keys with the right shapes.

use std::sync::LazyLock;

use serde::Deserialize;
use serde_json::Value;

use crate::{error::Result, json, services::LlmServices, session::StudyBrief};

/// Default upper bound on brief service calls per generation
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

static BRIEF_SCHEMA: LazyLock<jsonschema::Validator> = LazyLock::new(|| {
    let schema = serde_json::json!({
        "type": "object",
        "properties": {
            "objective_summary": { "type": "string" },
            "challenges": { "type": "array", "items": { "type": "string" } },
            "opportunities": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["objective_summary", "challenges", "opportunities"]
    });
    jsonschema::validator_for(&schema).expect("static brief schema")
});

#[derive(Debug, Deserialize)]
struct BriefResponse {
    objective_summary: String,
    challenges: Vec<String>,
    opportunities: Vec<String>,
}

impl From<BriefResponse> for StudyBrief {
    fn from(response: BriefResponse) -> Self {
        StudyBrief {
            objective: response.objective_summary,
            challenges: response.challenges,
            opportunities: response.opportunities,
        }
    }
}

/// Result of a brief generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BriefOutcome {
    Ready { brief: StudyBrief, attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Validate one raw service response
pub fn parse(text: &str) -> Option<StudyBrief> {
    let value: Value = json::parse_object(text)?;
    if !BRIEF_SCHEMA.is_valid(&value) {
        return None;
    }
    serde_json::from_value::<BriefResponse>(value)
        .ok()
        .map(StudyBrief::from)
}

/// Generate a brief, calling the service at most `max_attempts` times.
///
/// `on_attempt` observes each attempt number and whether it was accepted.
/// Transport failures and timeouts propagate instead of counting as attempts.
pub async fn generate_brief(
    services: &LlmServices,
    research_objective: &str,
    company: &str,
    max_attempts: u32,
    mut on_attempt: impl FnMut(u32, bool),
) -> Result<BriefOutcome> {
    for attempt in 1..=max_attempts {
        let text = services.draft_brief(research_objective, company).await?;
        match parse(&text) {
            Some(brief) => {
                on_attempt(attempt, true);
                tracing::debug!(attempt, "Brief accepted");
                return Ok(BriefOutcome::Ready {
                    brief,
                    attempts: attempt,
                });
            }
            None => {
                on_attempt(attempt, false);
                tracing::warn!(attempt, max_attempts, output = %text, "Rejected brief response");
            }
        }
    }

    Ok(BriefOutcome::Exhausted {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::*;

    const GOOD: &str = r#"{
        "objective_summary": "Assess Widget brand health.",
        "challenges": ["Low awareness", "Price competition"],
        "opportunities": ["New segments"]
    }"#;

    #[test]
    fn test_parse_complete_response() {
        let brief = parse(GOOD).unwrap();
        assert_eq!(brief.objective, "Assess Widget brand health.");
        assert_eq!(brief.challenges.len(), 2);
        assert_eq!(brief.opportunities, vec!["New segments".to_string()]);
    }

    #[test]
    fn test_parse_rejects_missing_or_mistyped_keys() {
        assert!(parse("{}").is_none());
        assert!(parse(r#"{"objective_summary": "x", "challenges": []}"#).is_none());
        assert!(
            parse(r#"{"objective_summary": "x", "challenges": "a", "opportunities": []}"#)
                .is_none()
        );
        assert!(
            parse(r#"{"objective_summary": "x", "challenges": [1], "opportunities": []}"#)
                .is_none()
        );
        assert!(parse("I cannot help with that.").is_none());
    }

    #[tokio::test]
    async fn test_complete_response_needs_one_call() {
        let transport = ScriptedTransport::new().brief_always(Reply::Text(GOOD.into()));
        let services = services(&transport);
        let mut seen = Vec::new();

        let outcome = generate_brief(&services, "obj", "Acme", 5, |a, ok| seen.push((a, ok)))
            .await
            .unwrap();

        assert!(matches!(outcome, BriefOutcome::Ready { attempts: 1, .. }));
        assert_eq!(transport.calls(Service::Brief), 1);
        assert_eq!(seen, vec![(1, true)]);
    }

    #[tokio::test]
    async fn test_empty_object_exhausts_after_exactly_five_calls() {
        let transport = ScriptedTransport::new().brief_always(Reply::Text("{}".into()));
        let services = services(&transport);

        let outcome = generate_brief(&services, "obj", "Acme", DEFAULT_MAX_ATTEMPTS, |_, _| {})
            .await
            .unwrap();

        assert_eq!(outcome, BriefOutcome::Exhausted { attempts: 5 });
        assert_eq!(transport.calls(Service::Brief), 5);
    }

    #[tokio::test]
    async fn test_recovers_after_malformed_responses() {
        let transport = ScriptedTransport::new()
            .brief(Reply::Text("not json at all".into()))
            .brief(Reply::Text(r#"{"challenges": []}"#.into()))
            .brief(Reply::Text(format!("```json\n{}\n```", GOOD)));
        let services = services(&transport);

        let outcome = generate_brief(&services, "obj", "Acme", 5, |_, _| {})
            .await
            .unwrap();

        match outcome {
            BriefOutcome::Ready { brief, attempts } => {
                assert_eq!(attempts, 3);
                assert_eq!(brief.challenges[0], "Low awareness");
            }
            other => panic!("expected a brief, got {:?}", other),
        }
        assert_eq!(transport.calls(Service::Brief), 3);
    }

    #[tokio::test]
    async fn test_blank_reply_counts_as_failed_attempt() {
        let transport = ScriptedTransport::new()
            .brief(Reply::Text(String::new()))
            .brief_always(Reply::Text(GOOD.into()));
        let services = services(&transport);
        let mut seen = Vec::new();

        let outcome = generate_brief(&services, "obj", "Acme", 5, |a, ok| seen.push((a, ok)))
            .await
            .unwrap();

        assert!(matches!(outcome, BriefOutcome::Ready { attempts: 2, .. }));
        assert_eq!(seen, vec![(1, false), (2, true)]);
        assert_eq!(transport.calls(Service::Brief), 2);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_an_attempt() {
        let transport = ScriptedTransport::new()
            .brief(Reply::Text("{}".into()))
            .brief(Reply::Error("HTTP 502: bad gateway".into()));
        let services = services(&transport);

        let result = generate_brief(&services, "obj", "Acme", 5, |_, _| {}).await;
        assert!(result.is_err());
        assert_eq!(transport.calls(Service::Brief), 2);
    }

    #[tokio::test]
    async fn test_prompt_carries_objective_and_company() {
        let transport = ScriptedTransport::new().brief_always(Reply::Text(GOOD.into()));
        let services = services(&transport);

        generate_brief(&services, "Track loyalty", "Acme Co", 5, |_, _| {})
            .await
            .unwrap();

        assert_eq!(
            transport.prompts(Service::Brief),
            vec!["Research Objective: Track loyalty\nCompany Name: Acme Co".to_string()]
        );
    }
}
