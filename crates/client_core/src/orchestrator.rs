use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures::StreamExt;
use generation::{
    partial::{decode_object, extract_string_field},
    LanguageModelSession, SessionError,
};
use serde::Serialize;
use shared::{
    error::{ErrorKind, GenerationError},
    protocol::{GeneratedDefinition, GeneratedWordType, GenerationKind, GenerationResult},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Everything presentation code needs to render a generation attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationState {
    /// Sequence number of the attempt that owns this state; 0 before the first.
    pub attempt: u64,
    pub kind: Option<GenerationKind>,
    pub phase: Phase,
    pub latest_result: Option<GenerationResult>,
    pub last_error: Option<GenerationError>,
    /// Every failure seen by the attempt, in observation order.
    pub errors: Vec<GenerationError>,
}

impl GenerationState {
    pub fn is_generating(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn definition(&self) -> Option<&str> {
        self.latest_result.as_ref()?.definition.as_deref()
    }
}

/// How an attempt ended from the point of view of its own caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
    /// A newer attempt started before this one settled; its results were dropped.
    Superseded,
}

pub struct GenerationOrchestrator {
    session: Arc<dyn LanguageModelSession>,
    timeout: Option<Duration>,
    state: Arc<watch::Sender<GenerationState>>,
    last_attempt: AtomicU64,
}

impl GenerationOrchestrator {
    pub fn new(session: Arc<dyn LanguageModelSession>) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            session,
            timeout: None,
            state: Arc::new(state),
            last_attempt: AtomicU64::new(0),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    pub fn is_generating(&self) -> bool {
        self.state.borrow().is_generating()
    }

    /// Asks the session to get ready. Never changes state; failures are
    /// logged. Bounded by the same timeout as generation attempts.
    pub async fn prewarm(&self) {
        let prewarm = self.session.prewarm();
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, prewarm).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        timeout_ms = limit.as_millis() as u64,
                        "language model prewarm timed out"
                    );
                    return;
                }
            },
            None => prewarm.await,
        };
        if let Err(error) = result {
            warn!(%error, "language model prewarm failed");
        }
    }

    pub async fn define(&self, word: &str) -> AttemptOutcome {
        self.generate(GenerationKind::Define, word).await
    }

    pub async fn classify(&self, word: &str) -> AttemptOutcome {
        self.generate(GenerationKind::Classify, word).await
    }

    pub async fn define_and_classify(&self, word: &str) -> AttemptOutcome {
        self.generate(GenerationKind::DefineAndClassify, word).await
    }

    /// Starts the attempt on the runtime and returns right away. The state is
    /// already `Running` when this returns.
    pub fn spawn_generate(
        self: &Arc<Self>,
        kind: GenerationKind,
        word: impl Into<String>,
    ) -> JoinHandle<AttemptOutcome> {
        let word = word.into();
        let in_flight = self.begin(kind, &word);
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.drive(in_flight, kind, &word).await })
    }

    pub async fn generate(&self, kind: GenerationKind, word: &str) -> AttemptOutcome {
        let in_flight = self.begin(kind, word);
        self.drive(in_flight, kind, word).await
    }

    fn begin(&self, kind: GenerationKind, word: &str) -> InFlight {
        let attempt = self.last_attempt.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            *state = GenerationState {
                attempt,
                kind: Some(kind),
                phase: Phase::Running,
                ..GenerationState::default()
            };
        });
        info!(attempt, kind = kind.as_str(), word, "generation started");
        InFlight {
            state: Arc::clone(&self.state),
            attempt,
            armed: true,
        }
    }

    async fn drive(
        &self,
        mut in_flight: InFlight,
        kind: GenerationKind,
        word: &str,
    ) -> AttemptOutcome {
        let attempt = in_flight.attempt;
        let work = self.run(attempt, kind, word);
        let succeeded = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(succeeded) => succeeded,
                Err(_) => {
                    self.record_error(
                        attempt,
                        GenerationError::new(
                            ErrorKind::Timeout,
                            format!("no response within {} ms", limit.as_millis()),
                        ),
                    );
                    false
                }
            },
            None => work.await,
        };

        in_flight.armed = false;
        self.finish(attempt, kind, succeeded)
    }

    async fn run(&self, attempt: u64, kind: GenerationKind, word: &str) -> bool {
        // Both halves run concurrently; a failure in one leaves the other running.
        let (definition_ok, classification_ok) = tokio::join!(
            async {
                if !kind.includes_definition() {
                    return true;
                }
                let result = self.run_definition(attempt, word).await;
                self.settle(attempt, result)
            },
            async {
                if !kind.includes_classification() {
                    return true;
                }
                let result = self.run_classification(attempt, word).await;
                self.settle(attempt, result)
            },
        );
        definition_ok && classification_ok
    }

    async fn run_definition(&self, attempt: u64, word: &str) -> Result<(), GenerationError> {
        let request = prompts::definition_request(word);
        let mut stream = self
            .session
            .stream_response(&request)
            .await
            .map_err(from_session_error)?;

        let mut received = String::new();
        let mut partials = 0usize;
        while let Some(chunk) = stream.next().await {
            received.push_str(&chunk.map_err(from_session_error)?);
            if let Some(definition) = extract_string_field(&received, "definition") {
                let changed = self.update_result(attempt, |result| {
                    if result.definition.as_deref() == Some(definition.as_str()) {
                        return false;
                    }
                    result.definition = Some(definition);
                    true
                });
                if changed {
                    partials += 1;
                }
            }
        }

        let complete: GeneratedDefinition =
            decode_object(&received).map_err(from_session_error)?;
        let definition = complete.definition.trim();
        if definition.is_empty() {
            return Err(GenerationError::malformed(
                "model returned an empty definition",
            ));
        }
        self.update_result(attempt, |result| {
            result.definition = Some(definition.to_string());
            result.definition_complete = true;
            true
        });
        debug!(attempt, partials, "definition stream finished");
        Ok(())
    }

    async fn run_classification(&self, attempt: u64, word: &str) -> Result<(), GenerationError> {
        let request = prompts::classification_request(word);
        let text = self
            .session
            .respond(&request)
            .await
            .map_err(from_session_error)?;
        let raw: GeneratedWordType = decode_object(&text).map_err(from_session_error)?;
        let classification = raw.validate()?;
        self.update_result(attempt, |result| {
            result.word_type = Some(classification);
            true
        });
        debug!(
            attempt,
            word_type = %classification.word_type,
            "classification finished"
        );
        Ok(())
    }

    fn settle(&self, attempt: u64, result: Result<(), GenerationError>) -> bool {
        match result {
            Ok(()) => true,
            Err(error) => {
                self.record_error(attempt, error);
                false
            }
        }
    }

    /// Writes into the result slot only while `attempt` is still current.
    fn update_result(
        &self,
        attempt: u64,
        apply: impl FnOnce(&mut GenerationResult) -> bool,
    ) -> bool {
        self.state.send_if_modified(|state| {
            if state.attempt != attempt || state.phase != Phase::Running {
                return false;
            }
            apply(state.latest_result.get_or_insert_with(GenerationResult::default))
        })
    }

    fn record_error(&self, attempt: u64, error: GenerationError) {
        warn!(attempt, kind = ?error.kind, error = %error.message, "generation step failed");
        self.state.send_if_modified(|state| {
            if state.attempt != attempt || state.phase != Phase::Running {
                return false;
            }
            state.errors.push(error.clone());
            state.last_error = Some(error);
            true
        });
    }

    fn finish(&self, attempt: u64, kind: GenerationKind, succeeded: bool) -> AttemptOutcome {
        let mut outcome = AttemptOutcome::Superseded;
        self.state.send_if_modified(|state| {
            if state.attempt != attempt {
                return false;
            }
            state.phase = if succeeded {
                outcome = AttemptOutcome::Succeeded;
                Phase::Succeeded
            } else {
                outcome = AttemptOutcome::Failed;
                Phase::Failed
            };
            true
        });

        match outcome {
            AttemptOutcome::Superseded => {
                debug!(attempt, kind = kind.as_str(), "discarding superseded generation")
            }
            _ => info!(attempt, kind = kind.as_str(), ?outcome, "generation finished"),
        }
        outcome
    }
}

/// Armed from the moment an attempt enters `Running`. Fails the attempt if it
/// is dropped before the attempt settles, so the phase never stays `Running`.
struct InFlight {
    state: Arc<watch::Sender<GenerationState>>,
    attempt: u64,
    armed: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let attempt = self.attempt;
        self.state.send_if_modified(|state| {
            if state.attempt != attempt || state.phase != Phase::Running {
                return false;
            }
            let error = GenerationError::new(
                ErrorKind::Cancelled,
                "generation was cancelled before it finished",
            );
            state.phase = Phase::Failed;
            state.errors.push(error.clone());
            state.last_error = Some(error);
            true
        });
    }
}

fn from_session_error(error: SessionError) -> GenerationError {
    match error {
        SessionError::Unavailable(message) | SessionError::Rejected(message) => {
            GenerationError::session_unavailable(message)
        }
        SessionError::Decode(message) => GenerationError::malformed(message),
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
