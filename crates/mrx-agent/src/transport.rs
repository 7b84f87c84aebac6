//! Transport abstraction for running generations

use std::{pin::Pin, sync::Arc, time::Duration};

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use mrx_ai::{
    Context, Message, Model, Result, StreamOptions, providers::LlmProvider,
    stream::MessageBuilder,
};
use tokio_stream::Stream;

use crate::events::AgentEvent;

/// Retry configuration for transient provider failures
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 disables retries)
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Configuration for one generation
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// System prompt
    pub system_prompt: Option<String>,
    /// Model to use
    pub model: Model,
    /// Maximum tokens per response
    pub max_tokens: Option<u32>,
    /// Temperature
    pub temperature: Option<f32>,
    /// Request JSON object output
    pub json_mode: bool,
}

impl RunConfig {
    fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            json_mode: self.json_mode,
        }
    }
}

/// A stream of agent events
pub type AgentEventStream = Pin<Box<dyn Stream<Item = AgentEvent> + Send>>;

/// Transport for running generations
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run a single generation, streaming events
    async fn run(
        &self,
        messages: Vec<Message>,
        user_message: Message,
        config: &RunConfig,
    ) -> Result<AgentEventStream>;
}

/// Direct provider transport - calls the LLM API
pub struct ProviderTransport {
    provider: Arc<dyn LlmProvider>,
    retry_config: RetryConfig,
}

impl ProviderTransport {
    /// Create a new provider transport
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            retry_config: RetryConfig::default(),
        }
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }
}

#[async_trait]
impl Transport for ProviderTransport {
    async fn run(
        &self,
        messages: Vec<Message>,
        user_message: Message,
        config: &RunConfig,
    ) -> Result<AgentEventStream> {
        let mut context = Context {
            system_prompt: config.system_prompt.clone(),
            messages,
        };
        context.push(user_message);

        let provider = Arc::clone(&self.provider);
        let model = config.model.clone();
        let options = config.stream_options();
        let retry_config = self.retry_config.clone();

        let event_stream: AgentEventStream = Box::pin(stream! {
            let mut attempt = 0u32;
            let message_stream;

            loop {
                match provider.stream(&model, &context, &options).await {
                    Ok(s) => {
                        message_stream = s;
                        break;
                    }
                    Err(e) => {
                        let error_msg = e.to_string();

                        if attempt < retry_config.max_retries && e.is_retryable() {
                            let delay = retry_config.delay_for_attempt(attempt);
                            tracing::warn!(
                                "Request failed (attempt {}/{}): {}. Retrying in {:?}...",
                                attempt + 1,
                                retry_config.max_retries + 1,
                                error_msg,
                                delay
                            );
                            attempt += 1;
                            tokio::time::sleep(delay).await;
                            continue;
                        }

                        yield AgentEvent::Error { message: error_msg };
                        return;
                    }
                }
            }

            let mut message_stream = message_stream;
            let mut builder = MessageBuilder::new();

            while let Some(event) = message_stream.next().await {
                builder.process_event(&event);

                match event {
                    mrx_ai::stream::MessageEvent::Start { message } => {
                        yield AgentEvent::MessageStart { message };
                    }
                    mrx_ai::stream::MessageEvent::TextDelta { .. } => {
                        yield AgentEvent::MessageUpdate {
                            text: builder.current_text().to_string(),
                        };
                    }
                    mrx_ai::stream::MessageEvent::Done { message, usage, .. } => {
                        yield AgentEvent::MessageEnd { message, usage };
                        return;
                    }
                    mrx_ai::stream::MessageEvent::Error { message } => {
                        yield AgentEvent::Error { message };
                        return;
                    }
                }
            }

            yield AgentEvent::Error {
                message: "Stream ended without a final message".to_string(),
            };
        });

        Ok(event_stream)
    }
}
