pub mod ai;
pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod state;

// Re-export main types for convenience
pub use ai::{ClaudeClient, Completion, EndpointClient, OllamaClient, OpenAIClient};
pub use chat::{ChatSession, Revision, SessionState, ERROR_RESPONSE, NO_RESPONSE};
pub use config::Config;
pub use error::RemoteError;
pub use provider::{build_backend, Provider};
pub use state::{ChatMessage, ChatRole, LabeledMessage, Transcript};
