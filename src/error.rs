use serde::Serialize;

use crate::completion::session::SessionState;

/// Failure of a single translation lookup.
///
/// Every variant maps to "no completions" for the editor; the message is only
/// ever surfaced as a best-effort status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Parse(_) => "parse",
            FetchError::Unknown(_) => "unknown",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Transport("request timed out".into())
        } else if err.is_connect() {
            FetchError::Transport(format!("connection failed: {err}"))
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("failed to build http client: {0}")]
    Client(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: SessionState, to: SessionState },
}
