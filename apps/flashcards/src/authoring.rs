//! Filling card fields with the language model before they are saved.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use client_core::{GenerationOrchestrator, GenerationState, Phase};
use generation::{LanguageModelSession, MissingSession, OllamaSession};
use shared::{
    domain::{Card, CardId, CardUpdate},
    protocol::GenerationKind,
};
use storage::Storage;
use tracing::{info, warn};

use crate::config::Settings;

pub async fn build_orchestrator(settings: &Settings) -> Result<Arc<GenerationOrchestrator>> {
    let session: Arc<dyn LanguageModelSession> = match settings.ollama_config() {
        Some(config) => {
            let session =
                OllamaSession::new(config).context("failed to set up the language model client")?;
            info!(model = session.model(), "using ollama session");
            Arc::new(session)
        }
        None => {
            warn!("no model_url configured; generation is unavailable");
            Arc::new(MissingSession)
        }
    };
    let orchestrator =
        GenerationOrchestrator::new(session).with_timeout(settings.generation_timeout());
    orchestrator.prewarm().await;
    Ok(Arc::new(orchestrator))
}

/// Turns a failed attempt into its last error, printing any earlier ones.
pub fn ensure_succeeded(state: GenerationState) -> Result<GenerationState> {
    if state.phase == Phase::Succeeded {
        return Ok(state);
    }
    let earlier = state.errors.len().saturating_sub(1);
    for error in &state.errors[..earlier] {
        eprintln!("error: {error}");
    }
    match state.last_error {
        Some(error) => Err(error.into()),
        None => bail!("generation did not finish"),
    }
}

/// Generates whichever of definition and word type `update` leaves unset.
/// Fields the user supplied are never sent for generation.
pub async fn fill_missing(settings: &Settings, word: &str, update: &mut CardUpdate) -> Result<()> {
    let Some(kind) =
        GenerationKind::covering(update.definition.is_none(), update.word_type.is_none())
    else {
        bail!("nothing to generate; the definition and word type were both given");
    };

    let orchestrator = build_orchestrator(settings).await?;
    generate_missing(&orchestrator, kind, word, update).await
}

async fn generate_missing(
    orchestrator: &GenerationOrchestrator,
    kind: GenerationKind,
    word: &str,
    update: &mut CardUpdate,
) -> Result<()> {
    orchestrator.generate(kind, word.trim()).await;
    let state = orchestrator.snapshot();

    let filled = merge_generated(update, &state, kind);
    if state.phase == Phase::Succeeded {
        return Ok(());
    }
    if !filled {
        return ensure_succeeded(state).map(|_| ());
    }
    for error in &state.errors {
        eprintln!("warning: {error}");
    }
    Ok(())
}

/// Saves an edit, first generating the unset fields when `generate` is set.
/// Generation uses the edited word if the edit renames the card.
pub async fn apply_edit(
    storage: &Storage,
    settings: &Settings,
    id: CardId,
    mut update: CardUpdate,
    generate: bool,
) -> Result<Card> {
    if generate {
        let Some(card) = storage.get_card(id).await? else {
            bail!("card {id} not found");
        };
        let word = update.word.clone().unwrap_or(card.word);
        fill_missing(settings, &word, &mut update).await?;
    }
    if update.is_empty() {
        bail!("nothing to change; pass --word, --definition, --word-type, --clear-word-type or --generate");
    }
    let Some(card) = storage.update_card(id, update).await? else {
        bail!("card {id} not found");
    };
    info!(card_id = id.0, "card updated");
    Ok(card)
}

/// Copies completed results of `kind` into the unset fields of `update`.
/// Returns whether anything was filled.
pub fn merge_generated(
    update: &mut CardUpdate,
    state: &GenerationState,
    kind: GenerationKind,
) -> bool {
    let Some(result) = &state.latest_result else {
        return false;
    };
    let mut filled = false;

    if kind.includes_definition() && update.definition.is_none() && result.definition_complete {
        if let Some(definition) = result
            .definition
            .as_deref()
            .map(str::trim)
            .filter(|definition| !definition.is_empty())
        {
            update.definition = Some(definition.to_string());
            filled = true;
        }
    }
    if kind.includes_classification() && update.word_type.is_none() {
        if let Some(classification) = result.word_type {
            update.word_type = Some(Some(classification.word_type));
            filled = true;
        }
    }
    filled
}

#[cfg(test)]
#[path = "tests/authoring_tests.rs"]
mod tests;
