use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

pub mod ollama;
pub mod partial;

pub use ollama::{OllamaConfig, OllamaSession};

/// Text chunks produced by a streaming response, in arrival order.
pub type TextStream = BoxStream<'static, Result<String, SessionError>>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("language model unavailable: {0}")]
    Unavailable(String),
    #[error("language model rejected the request: {0}")]
    Rejected(String),
    #[error("could not decode language model output: {0}")]
    Decode(String),
}

/// One request to a language model session: system instructions, the task
/// prompt, and example outputs that steer the response shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub instructions: Vec<String>,
    pub prompt: Vec<String>,
    pub examples: Vec<Value>,
}

impl GenerationRequest {
    pub fn render_instructions(&self) -> String {
        self.instructions.join("\n")
    }

    /// Prompt lines followed by each example as compact JSON.
    pub fn render_prompt(&self) -> String {
        let mut lines = self.prompt.clone();
        lines.extend(self.examples.iter().map(Value::to_string));
        lines.join("\n")
    }
}

#[async_trait]
pub trait LanguageModelSession: Send + Sync {
    /// Hint that a request is coming soon. Repeated calls are harmless.
    async fn prewarm(&self) -> Result<(), SessionError>;
    async fn respond(&self, request: &GenerationRequest) -> Result<String, SessionError>;
    async fn stream_response(&self, request: &GenerationRequest)
        -> Result<TextStream, SessionError>;
}

/// Stand-in used when no model is configured.
pub struct MissingSession;

#[async_trait]
impl LanguageModelSession for MissingSession {
    async fn prewarm(&self) -> Result<(), SessionError> {
        Err(SessionError::Unavailable(
            "no language model is configured".to_string(),
        ))
    }

    async fn respond(&self, _request: &GenerationRequest) -> Result<String, SessionError> {
        Err(SessionError::Unavailable(
            "no language model is configured".to_string(),
        ))
    }

    async fn stream_response(
        &self,
        _request: &GenerationRequest,
    ) -> Result<TextStream, SessionError> {
        Err(SessionError::Unavailable(
            "no language model is configured".to_string(),
        ))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
