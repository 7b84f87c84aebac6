//! Streaming event types and utilities

use crate::types::{AssistantMetadata, Message, StopReason, Usage};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted during message streaming
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEvent {
    /// Initial message structure
    Start { message: Message },
    /// Text content delta
    TextDelta { delta: String },
    /// Message completed successfully
    Done {
        message: Message,
        stop_reason: StopReason,
        usage: Usage,
    },
    /// Error occurred
    Error { message: String },
}

impl MessageEvent {
    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageEvent::Done { .. } | MessageEvent::Error { .. })
    }
}

/// A stream of message events
pub type MessageEventStream = Pin<Box<dyn Stream<Item = MessageEvent> + Send>>;

/// Builder for constructing an assistant message from streaming events
#[derive(Debug, Default)]
pub struct MessageBuilder {
    text: String,
    usage: Usage,
    stop_reason: Option<StopReason>,
}

impl MessageBuilder {
    /// Create a new message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a streaming event and update the message state
    pub fn process_event(&mut self, event: &MessageEvent) {
        match event {
            MessageEvent::TextDelta { delta } => self.text.push_str(delta),
            MessageEvent::Done {
                message,
                stop_reason,
                usage,
            } => {
                // The final message is authoritative over accumulated deltas
                if !message.text().is_empty() {
                    self.text = message.text().to_string();
                }
                self.stop_reason = Some(*stop_reason);
                self.usage = usage.clone();
            }
            _ => {}
        }
    }

    /// Text accumulated so far
    pub fn current_text(&self) -> &str {
        &self.text
    }

    /// Build the final message
    pub fn build(self) -> Message {
        Message::Assistant {
            text: self.text,
            metadata: AssistantMetadata {
                usage: self.usage,
                stop_reason: self.stop_reason,
                timestamp: chrono::Utc::now().timestamp_millis(),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates_deltas() {
        let mut builder = MessageBuilder::new();
        builder.process_event(&MessageEvent::TextDelta { delta: "Hel".into() });
        builder.process_event(&MessageEvent::TextDelta { delta: "lo".into() });
        assert_eq!(builder.current_text(), "Hello");

        let msg = builder.build();
        assert_eq!(msg.text(), "Hello");
        assert_eq!(msg.role(), "assistant");
    }

    #[test]
    fn test_builder_prefers_done_message() {
        let mut builder = MessageBuilder::new();
        builder.process_event(&MessageEvent::TextDelta { delta: "partial".into() });
        builder.process_event(&MessageEvent::Done {
            message: Message::assistant("complete text"),
            stop_reason: StopReason::Stop,
            usage: Usage { input: 3, output: 2 },
        });

        match builder.build() {
            Message::Assistant { text, metadata } => {
                assert_eq!(text, "complete text");
                assert_eq!(metadata.stop_reason, Some(StopReason::Stop));
                assert_eq!(metadata.usage.output, 2);
            }
            other => panic!("expected assistant message, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_events() {
        assert!(MessageEvent::Error { message: "x".into() }.is_terminal());
        assert!(!MessageEvent::TextDelta { delta: "x".into() }.is_terminal());
    }
}
