//! Session backed by a local Ollama server, the on-device model runtime.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};
use url::Url;

use crate::{
    partial::truncate_for_log, GenerationRequest, LanguageModelSession, SessionError, TextStream,
};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434/";
const STREAM_CHANNEL_CAPACITY: usize = 64;
const MAX_LOG_CHARS: usize = 2_000;

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// How long the server keeps the model loaded after a request, e.g. "10m".
    pub keep_alive: Option<String>,
    pub connect_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.3,
            keep_alive: Some("10m".to_string()),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

pub struct OllamaSession {
    http: Client,
    chat_url: Url,
    config: OllamaConfig,
}

impl OllamaSession {
    pub fn new(config: OllamaConfig) -> Result<Self, SessionError> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SessionError::Unavailable(e.to_string()))?;
        let chat_url = chat_url(&config.base_url)?;
        Ok(Self {
            http,
            chat_url,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn chat_body<'a>(&'a self, request: &GenerationRequest, stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.render_instructions(),
                },
                ChatMessage {
                    role: "user",
                    content: request.render_prompt(),
                },
            ],
            stream,
            format: Some("json"),
            options: Some(ChatOptions {
                temperature: self.config.temperature,
            }),
            keep_alive: self.config.keep_alive.as_deref(),
        }
    }

    async fn post_chat(&self, body: &ChatRequest<'_>) -> Result<Response, SessionError> {
        let response = self
            .http
            .post(self.chat_url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ChatFrame>(&text)
                .ok()
                .and_then(|frame| frame.error)
                .unwrap_or(text);
            return Err(SessionError::Rejected(format!("HTTP {status}: {detail}")));
        }
        Ok(response)
    }
}

fn chat_url(base_url: &str) -> Result<Url, SessionError> {
    let mut base = Url::parse(base_url.trim())
        .map_err(|e| SessionError::Unavailable(format!("invalid model url '{base_url}': {e}")))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/chat")
        .map_err(|e| SessionError::Unavailable(format!("invalid model url '{base_url}': {e}")))
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatFrame {
    #[serde(default)]
    message: Option<ChatFrameMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatFrameMessage {
    #[serde(default)]
    content: String,
}

/// Decodes one NDJSON line. Blank lines yield `None`.
fn decode_frame(line: &[u8]) -> Result<Option<ChatFrame>, SessionError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let frame: ChatFrame = serde_json::from_str(line).map_err(|e| {
        SessionError::Decode(format!(
            "invalid stream frame ({e}): {}",
            truncate_for_log(line, 200)
        ))
    })?;
    if let Some(error) = frame.error {
        return Err(SessionError::Rejected(error));
    }
    Ok(Some(frame))
}

/// Forwards frame contents until the server marks the stream done. Returns
/// `false` once the stream is finished or the receiver has gone away.
async fn forward_line(
    line: &[u8],
    tx: &mpsc::Sender<Result<String, SessionError>>,
) -> bool {
    match decode_frame(line) {
        Ok(None) => true,
        Ok(Some(frame)) => {
            if let Some(message) = frame.message {
                if !message.content.is_empty() && tx.send(Ok(message.content)).await.is_err() {
                    return false;
                }
            }
            !frame.done
        }
        Err(error) => {
            let _ = tx.send(Err(error)).await;
            false
        }
    }
}

async fn pump_ndjson(response: Response, tx: mpsc::Sender<Result<String, SessionError>>) {
    let mut body = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(error) => {
                let _ = tx
                    .send(Err(SessionError::Unavailable(format!(
                        "stream interrupted: {error}"
                    ))))
                    .await;
                return;
            }
        };
        buffer.extend_from_slice(&chunk);

        while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            if !forward_line(&line, &tx).await {
                return;
            }
        }
    }

    if !buffer.is_empty() {
        forward_line(&buffer, &tx).await;
    }
}

#[async_trait]
impl LanguageModelSession for OllamaSession {
    async fn prewarm(&self) -> Result<(), SessionError> {
        // An empty conversation makes the server load the model and return.
        let body = ChatRequest {
            model: &self.config.model,
            messages: Vec::new(),
            stream: false,
            format: None,
            options: None,
            keep_alive: self.config.keep_alive.as_deref(),
        };
        self.post_chat(&body).await?;
        info!(model = %self.config.model, "language model prewarmed");
        Ok(())
    }

    async fn respond(&self, request: &GenerationRequest) -> Result<String, SessionError> {
        let body = self.chat_body(request, false);
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                model = %self.config.model,
                prompt = %truncate_for_log(&body.messages[1].content, MAX_LOG_CHARS),
                "sending chat request"
            );
        }
        let text = self
            .post_chat(&body)
            .await?
            .text()
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))?;

        let frame = decode_frame(text.as_bytes())?
            .ok_or_else(|| SessionError::Decode("empty response body".to_string()))?;
        let content = frame
            .message
            .map(|message| message.content)
            .ok_or_else(|| SessionError::Decode("response is missing a message".to_string()))?;
        debug!(
            content = %truncate_for_log(&content, MAX_LOG_CHARS),
            "received chat response"
        );
        Ok(content)
    }

    async fn stream_response(
        &self,
        request: &GenerationRequest,
    ) -> Result<TextStream, SessionError> {
        let body = self.chat_body(request, true);
        let response = self.post_chat(&body).await?;
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            pump_ndjson(response, tx).await;
        });
        debug!(model = %self.config.model, "chat stream opened");
        Ok(ReceiverStream::new(rx).boxed())
    }
}

#[cfg(test)]
#[path = "tests/ollama_tests.rs"]
mod tests;
