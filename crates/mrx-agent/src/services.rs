//! LLM-backed services: entity extraction, brief drafting and dialogue polish.
//!
//! Each service sends a fixed system prompt plus one user message through the
//! transport and returns the generated text. Calls are bounded by a timeout;
//! none of them retries on its own.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use mrx_ai::{Message, Model};

use crate::{
    error::{Error, Result},
    events::AgentEvent,
    prompts,
    transport::{RunConfig, Transport},
};

/// Generation settings shared by all services
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model: Model,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Upper bound for one complete LLM round trip
    pub timeout: Duration,
}

impl ServiceConfig {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            temperature: Some(0.0),
            max_tokens: Some(4096),
            timeout: Duration::from_secs(60),
        }
    }
}

/// The three request/response calls the conversation core depends on
pub struct LlmServices {
    transport: Arc<dyn Transport>,
    config: ServiceConfig,
}

impl LlmServices {
    pub fn new(transport: Arc<dyn Transport>, config: ServiceConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Ask for `{company_name, product_or_service}` as JSON
    pub async fn extract_entities(&self, research_objective: &str) -> Result<String> {
        let prompt = prompts::render(
            prompts::EXTRACTION_PROMPT,
            &[("research_objective", research_objective)],
        );
        self.generate(prompts::EXTRACTION_SYSTEM_PROMPT, prompt, true)
            .await
    }

    /// Ask for `{objective_summary, challenges, opportunities}` as JSON
    pub async fn draft_brief(&self, research_objective: &str, company_name: &str) -> Result<String> {
        let prompt = prompts::render(
            prompts::BRIEF_PROMPT,
            &[
                ("research_objective", research_objective),
                ("company_name", company_name),
            ],
        );
        self.generate(prompts::BRIEF_SYSTEM_PROMPT, prompt, true).await
    }

    /// Rephrase a templated agent message for the user
    pub async fn polish(&self, conversation_history: &str, agent_message: &str) -> Result<String> {
        let prompt = prompts::render(
            prompts::DIALOGUE_PROMPT,
            &[
                ("conversation_history", conversation_history),
                ("agent_message", agent_message),
            ],
        );
        let text = self
            .generate(prompts::DIALOGUE_SYSTEM_PROMPT, prompt, false)
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Generation("empty response".to_string()));
        }
        Ok(text.to_string())
    }

    async fn generate(&self, system_prompt: &str, prompt: String, json_mode: bool) -> Result<String> {
        let run_config = RunConfig {
            system_prompt: Some(system_prompt.to_string()),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            json_mode,
        };

        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.run_to_completion(prompt, &run_config)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(?timeout, "LLM call timed out");
                Err(Error::Timeout(timeout))
            }
        }
    }

    async fn run_to_completion(&self, prompt: String, run_config: &RunConfig) -> Result<String> {
        let mut event_stream = self
            .transport
            .run(vec![], Message::user(prompt), run_config)
            .await?;

        let mut streamed = String::new();
        let mut result_text = String::new();

        while let Some(event) = event_stream.next().await {
            let terminal = event.is_terminal();
            match event {
                AgentEvent::MessageStart { .. } => {
                    tracing::trace!("LLM response started");
                }
                AgentEvent::MessageUpdate { text } => {
                    streamed = text;
                }
                AgentEvent::MessageEnd { message, usage } => {
                    tracing::debug!(input = usage.input, output = usage.output, "LLM call finished");
                    result_text = if message.text().is_empty() {
                        std::mem::take(&mut streamed)
                    } else {
                        message.text().to_string()
                    };
                }
                AgentEvent::Error { message } => {
                    return Err(Error::Generation(message));
                }
            }
            if terminal {
                break;
            }
        }

        // Blank output is left for the caller to judge
        Ok(result_text)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for exercising the services without a network.

    use super::*;
    use crate::transport::AgentEventStream;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Which service a request belongs to, derived from its system prompt
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Service {
        Extraction,
        Brief,
        Polish,
    }

    impl Service {
        fn of(config: &RunConfig) -> Service {
            match config.system_prompt.as_deref() {
                Some(prompts::EXTRACTION_SYSTEM_PROMPT) => Service::Extraction,
                Some(prompts::BRIEF_SYSTEM_PROMPT) => Service::Brief,
                _ => Service::Polish,
            }
        }
    }

    /// A canned reply
    #[derive(Debug, Clone)]
    pub enum Reply {
        Text(String),
        Error(String),
        Hang,
    }

    #[derive(Default)]
    struct Script {
        extraction: VecDeque<Reply>,
        brief: VecDeque<Reply>,
        brief_fallback: Option<Reply>,
        polish: VecDeque<Reply>,
        calls: Vec<(Service, String)>,
    }

    /// Replies are consumed in order per service. When a brief queue is
    /// empty the fallback is repeated; an empty polish queue echoes the
    /// agent message.
    #[derive(Default, Clone)]
    pub struct ScriptedTransport {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn extraction(self, reply: Reply) -> Self {
            self.script.lock().extraction.push_back(reply);
            self
        }

        pub fn brief(self, reply: Reply) -> Self {
            self.script.lock().brief.push_back(reply);
            self
        }

        pub fn brief_always(self, reply: Reply) -> Self {
            self.script.lock().brief_fallback = Some(reply);
            self
        }

        pub fn polish(self, reply: Reply) -> Self {
            self.script.lock().polish.push_back(reply);
            self
        }

        pub fn calls(&self, service: Service) -> usize {
            self.script
                .lock()
                .calls
                .iter()
                .filter(|(s, _)| *s == service)
                .count()
        }

        pub fn prompts(&self, service: Service) -> Vec<String> {
            self.script
                .lock()
                .calls
                .iter()
                .filter(|(s, _)| *s == service)
                .map(|(_, p)| p.clone())
                .collect()
        }

        fn next_reply(&self, service: Service, prompt: &str) -> Reply {
            let mut script = self.script.lock();
            script.calls.push((service, prompt.to_string()));
            match service {
                Service::Extraction => script
                    .extraction
                    .pop_front()
                    .unwrap_or_else(|| Reply::Text("{}".into())),
                Service::Brief => match script.brief.pop_front() {
                    Some(reply) => reply,
                    None => script
                        .brief_fallback
                        .clone()
                        .unwrap_or_else(|| Reply::Text("{}".into())),
                },
                Service::Polish => {
                    if let Some(reply) = script.polish.pop_front() {
                        return reply;
                    }
                    let agent_message = prompt
                        .split_once("Agent message: ")
                        .map(|(_, m)| m.to_string())
                        .unwrap_or_default();
                    Reply::Text(format!("[polished] {}", agent_message))
                }
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn run(
            &self,
            _messages: Vec<Message>,
            user_message: Message,
            config: &RunConfig,
        ) -> mrx_ai::Result<AgentEventStream> {
            let reply = self.next_reply(Service::of(config), user_message.text());

            let stream: AgentEventStream = Box::pin(async_stream::stream! {
                match reply {
                    Reply::Text(text) => {
                        yield AgentEvent::MessageStart { message: Message::assistant("") };
                        yield AgentEvent::MessageUpdate { text: text.clone() };
                        yield AgentEvent::MessageEnd {
                            message: Message::assistant(text),
                            usage: mrx_ai::Usage::default(),
                        };
                    }
                    Reply::Error(message) => {
                        yield AgentEvent::Error { message };
                    }
                    Reply::Hang => {
                        futures::future::pending::<()>().await;
                    }
                }
            });
            Ok(stream)
        }
    }

    pub fn test_model() -> Model {
        mrx_ai::models::resolve(mrx_ai::Provider::OpenAI, "gpt-4o-mini", None)
    }

    pub fn services(transport: &ScriptedTransport) -> Arc<LlmServices> {
        let mut config = ServiceConfig::new(test_model());
        config.timeout = Duration::from_secs(5);
        Arc::new(LlmServices::new(Arc::new(transport.clone()), config))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_extraction_prompt_carries_objective() {
        let transport = ScriptedTransport::new().extraction(Reply::Text(
            r#"{"company_name":"Acme Co","product_or_service":"Widget"}"#.into(),
        ));
        let services = services(&transport);

        let text = services.extract_entities("Grow Widget sales").await.unwrap();
        assert!(text.contains("Acme Co"));
        assert_eq!(
            transport.prompts(Service::Extraction),
            vec!["Market Research Objective: Grow Widget sales".to_string()]
        );
    }

    #[tokio::test]
    async fn test_polish_trims_output() {
        let transport = ScriptedTransport::new();
        let services = services(&transport);

        let text = services.polish("User: hi", "Pick one.").await.unwrap();
        assert_eq!(text, "[polished] Pick one.");
        assert_eq!(transport.calls(Service::Polish), 1);
    }

    #[tokio::test]
    async fn test_stream_error_is_generation_error() {
        let transport = ScriptedTransport::new().brief(Reply::Error("HTTP 500: boom".into()));
        let services = services(&transport);

        let err = services.draft_brief("obj", "Acme").await.unwrap_err();
        assert!(matches!(err, Error::Generation(ref m) if m.contains("boom")));
    }

    #[tokio::test]
    async fn test_blank_json_reply_is_returned_for_validation() {
        let transport = ScriptedTransport::new().brief(Reply::Text("   ".into()));
        let services = services(&transport);

        let text = services.draft_brief("obj", "Acme").await.unwrap();
        assert!(text.trim().is_empty());
    }

    #[tokio::test]
    async fn test_blank_polish_is_generation_error() {
        let transport = ScriptedTransport::new().polish(Reply::Text(" \n ".into()));
        let services = services(&transport);

        let err = services.polish("User: hi", "Pick one.").await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let transport = ScriptedTransport::new().extraction(Reply::Hang);
        let services = services(&transport);

        let err = services.extract_entities("obj").await.unwrap_err();
        assert!(err.is_timeout());
    }
}
