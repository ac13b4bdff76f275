//! Reply generation for the wall's side of the conversation
//!
//! The dialogue history and the generator seam live here; the concrete
//! implementation talks to a local Ollama endpoint.

mod client;
mod error;
mod ollama;
mod types;

pub use client::Responder;
pub use error::LlmError;
pub use ollama::OllamaClient;
pub use types::{ChatMessage, ChatRole};

#[cfg(test)]
pub use client::mock::MockResponder;
