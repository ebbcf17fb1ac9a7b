use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SessionUnavailable,
    MalformedResponse,
    ValidationFailed,
    Timeout,
    Superseded,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::SessionUnavailable => "session unavailable",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::ValidationFailed => "validation failed",
            ErrorKind::Timeout => "timed out",
            ErrorKind::Superseded => "superseded",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Failure of a single generation attempt, rendered directly to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}: {message}", kind.as_str())]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn session_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionUnavailable, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown word type '{0}'")]
pub struct UnknownWordType(pub String);

impl From<UnknownWordType> for GenerationError {
    fn from(value: UnknownWordType) -> Self {
        GenerationError::validation(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CardValidationError {
    #[error("word must not be empty")]
    EmptyWord,
    #[error("definition must not be empty")]
    EmptyDefinition,
}
