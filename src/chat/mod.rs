//! Azure OpenAI chat-completion client.

pub mod client;
pub mod types;

pub use client::{ChatClient, ChatCompletion, ChatError};
pub use types::ChatMessage;
