//! Company/product extraction from a research objective.

use serde::Deserialize;

use crate::{error::Result, json, services::LlmServices};

/// Calls made before giving up on malformed extraction output
const EXTRACTION_ATTEMPTS: u32 = 2;

/// Literal the extraction prompt uses for "could not determine"
pub const NOT_FOUND: &str = "Not Found.";

/// Fields pulled out of a research objective
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Extraction {
    pub company_name: String,
    pub product_or_service: String,
}

impl Extraction {
    /// The company, unless the model could not resolve one
    pub fn company(&self) -> Option<&str> {
        resolved(&self.company_name)
    }

    /// The product or service, unless the model could not resolve one
    pub fn product(&self) -> Option<&str> {
        resolved(&self.product_or_service)
    }
}

/// `None` for blank values and "Not Found." variants
pub fn resolved(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let bare = trimmed.trim_end_matches('.');
    if bare.is_empty() || bare.eq_ignore_ascii_case("not found") {
        None
    } else {
        Some(trimmed)
    }
}

/// Parse the extraction service's output
pub fn parse(text: &str) -> Option<Extraction> {
    let value = json::parse_object(text)?;
    serde_json::from_value(value).ok()
}

/// Run extraction, retrying once on malformed output.
///
/// Returns `Ok(None)` when every attempt produced unusable output. Transport
/// failures and timeouts propagate.
pub async fn extract(services: &LlmServices, research_objective: &str) -> Result<Option<Extraction>> {
    for attempt in 1..=EXTRACTION_ATTEMPTS {
        let text = services.extract_entities(research_objective).await?;
        match parse(&text) {
            Some(extraction) => {
                tracing::debug!(
                    company = %extraction.company_name,
                    product = %extraction.product_or_service,
                    "Extracted entities"
                );
                return Ok(Some(extraction));
            }
            None => {
                tracing::warn!(attempt, output = %text, "Malformed extraction output");
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::*;

    #[test]
    fn test_resolved_variants() {
        assert_eq!(resolved("Acme Co"), Some("Acme Co"));
        assert_eq!(resolved("  Acme Co "), Some("Acme Co"));
        assert_eq!(resolved("Not Found."), None);
        assert_eq!(resolved("not found"), None);
        assert_eq!(resolved(""), None);
        assert_eq!(resolved("Acme Inc."), Some("Acme Inc."));
    }

    #[test]
    fn test_parse_requires_both_fields() {
        assert!(parse(r#"{"company_name": "Acme Co"}"#).is_none());
        let parsed = parse(r#"{"company_name": "Acme Co", "product_or_service": "Not Found."}"#)
            .unwrap();
        assert_eq!(parsed.company(), Some("Acme Co"));
        assert_eq!(parsed.product(), None);
    }

    #[tokio::test]
    async fn test_extract_retries_once_then_succeeds() {
        let transport = ScriptedTransport::new()
            .extraction(Reply::Text("not json".into()))
            .extraction(Reply::Text(
                r#"{"company_name":"Acme Co","product_or_service":"Widget"}"#.into(),
            ));
        let services = services(&transport);

        let extraction = extract(&services, "objective").await.unwrap().unwrap();
        assert_eq!(extraction.company(), Some("Acme Co"));
        assert_eq!(transport.calls(Service::Extraction), 2);
    }

    #[tokio::test]
    async fn test_extract_gives_up_after_two_calls() {
        let transport = ScriptedTransport::new()
            .extraction(Reply::Text("nope".into()))
            .extraction(Reply::Text("still nope".into()))
            .extraction(Reply::Text(
                r#"{"company_name":"Late","product_or_service":"Late"}"#.into(),
            ));
        let services = services(&transport);

        assert!(extract(&services, "objective").await.unwrap().is_none());
        assert_eq!(transport.calls(Service::Extraction), 2);
    }

    #[tokio::test]
    async fn test_blank_replies_are_malformed_not_errors() {
        let transport = ScriptedTransport::new()
            .extraction(Reply::Text(String::new()))
            .extraction(Reply::Text("  ".into()));
        let services = services(&transport);

        assert!(extract(&services, "objective").await.unwrap().is_none());
        assert_eq!(transport.calls(Service::Extraction), 2);
    }

    #[tokio::test]
    async fn test_extract_propagates_transport_errors() {
        let transport = ScriptedTransport::new().extraction(Reply::Error("HTTP 503".into()));
        let services = services(&transport);

        assert!(extract(&services, "objective").await.is_err());
        assert_eq!(transport.calls(Service::Extraction), 1);
    }
}
