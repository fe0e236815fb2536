use thiserror::Error;

/// Failure of a chat-completion call.
///
/// The chat session treats every variant the same way: it is logged and
/// replaced by a fixed transcript entry. The variants exist so the log line
/// says what actually went wrong.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0} API key not configured")]
    MissingKey(&'static str),

    #[error("completion task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for RemoteError {
    fn from(err: tokio::task::JoinError) -> Self {
        RemoteError::Task(err.to_string())
    }
}
