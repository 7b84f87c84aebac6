//! mrx-ai: LLM provider abstraction layer
//!
//! This crate provides the text generation client used by the study assistant:
//! request/response types, streaming events, and an OpenAI-compatible
//! chat completions provider.

pub mod error;
pub mod models;
pub mod providers;
pub mod stream;
pub mod types;

pub use error::{Error, Result};
pub use stream::MessageEventStream;
pub use types::*;
