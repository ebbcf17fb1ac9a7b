use std::{io::Write, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::GenerationOrchestrator;
use shared::{
    domain::{CardId, CardUpdate, NewCard, WordType},
    protocol::GenerationKind,
};
use storage::{SortOrder, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod authoring;
mod config;
mod display;
mod study;

use config::{load_settings, normalize_database_url, Settings, CONFIG_FILE};

#[derive(Parser, Debug)]
#[command(name = "flashcards", about = "Vocabulary flashcards with generated definitions")]
struct Cli {
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    /// Ollama server, e.g. http://127.0.0.1:11434
    #[arg(long)]
    model_url: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// Seconds before a generation attempt gives up; 0 waits forever.
    #[arg(long)]
    timeout_seconds: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a card, typing the definition or generating it.
    Add {
        word: String,
        #[arg(long)]
        definition: Option<String>,
        /// Fill in the definition and word type with the language model.
        #[arg(long)]
        generate: bool,
    },
    /// List cards, newest first.
    List {
        #[arg(long)]
        oldest_first: bool,
    },
    Show {
        id: i64,
    },
    Edit {
        id: i64,
        #[arg(long)]
        word: Option<String>,
        #[arg(long)]
        definition: Option<String>,
        #[arg(long, conflicts_with = "clear_word_type")]
        word_type: Option<WordType>,
        #[arg(long)]
        clear_word_type: bool,
        /// Regenerate whichever of definition and word type is not given.
        #[arg(long)]
        generate: bool,
    },
    Delete {
        id: i64,
    },
    /// Stream a definition for a word without saving it.
    Define {
        word: String,
    },
    /// Classify a word's grammatical type without saving it.
    Classify {
        word: String,
    },
    /// Define and classify a word without saving it.
    Generate {
        word: String,
    },
    /// Walk through the cards one at a time.
    Study,
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(v) = &self.database_url {
            settings.database_url = v.clone();
        }
        if let Some(v) = &self.model_url {
            settings.model_url = Some(v.clone());
        }
        if let Some(v) = &self.model {
            settings.model = v.clone();
        }
        if let Some(v) = self.timeout_seconds {
            settings.generation_timeout_seconds = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    cli.apply_overrides(&mut settings);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url)
        .await
        .with_context(|| format!("failed to open card database '{database_url}'"))?;
    storage.health_check().await?;
    info!(%database_url, "card database ready");

    match cli.command {
        Command::Add {
            word,
            definition,
            generate,
        } => add_card(&storage, &settings, word, definition, generate).await?,
        Command::List { oldest_first } => {
            let order = if oldest_first {
                SortOrder::Ascending
            } else {
                SortOrder::Descending
            };
            let cards = storage.list_cards(order).await?;
            if cards.is_empty() {
                println!("No cards yet.");
            }
            for card in &cards {
                println!("{}", display::card_line(card));
            }
        }
        Command::Show { id } => {
            let Some(card) = storage.get_card(CardId(id)).await? else {
                bail!("card {id} not found");
            };
            println!("{}", display::card_details(&card));
        }
        Command::Edit {
            id,
            word,
            definition,
            word_type,
            clear_word_type,
            generate,
        } => {
            let update = CardUpdate {
                word,
                definition,
                word_type: if clear_word_type {
                    Some(None)
                } else {
                    word_type.map(Some)
                },
            };
            let card =
                authoring::apply_edit(&storage, &settings, CardId(id), update, generate).await?;
            println!("{}", display::card_details(&card));
        }
        Command::Delete { id } => {
            if !storage.delete_card(CardId(id)).await? {
                bail!("card {id} not found");
            }
            println!("Deleted card {id}.");
        }
        Command::Define { word } => {
            let orchestrator = authoring::build_orchestrator(&settings).await?;
            stream_definition(&orchestrator, &word).await?;
        }
        Command::Classify { word } => {
            let orchestrator = authoring::build_orchestrator(&settings).await?;
            orchestrator.classify(&word).await;
            let state = authoring::ensure_succeeded(orchestrator.snapshot())?;
            if let Some(word_type) = state.latest_result.and_then(|result| result.word_type) {
                println!("{}", display::classification(&word, &word_type));
            }
        }
        Command::Generate { word } => {
            let orchestrator = authoring::build_orchestrator(&settings).await?;
            orchestrator.define_and_classify(&word).await;
            let state = authoring::ensure_succeeded(orchestrator.snapshot())?;
            if let Some(result) = state.latest_result {
                if let Some(word_type) = result.word_type {
                    println!("{}", display::classification(&word, &word_type));
                }
                if let Some(definition) = result.definition {
                    println!("{definition}");
                }
            }
        }
        Command::Study => study::run(&storage, &settings).await?,
    }

    Ok(())
}

/// Prints the definition as it is typed out by the model.
async fn stream_definition(orchestrator: &Arc<GenerationOrchestrator>, word: &str) -> Result<()> {
    let handle = orchestrator.spawn_generate(GenerationKind::Define, word);
    let mut updates = orchestrator.subscribe();
    let mut printed = String::new();

    loop {
        let state = updates.borrow_and_update().clone();
        if let Some(definition) = state.definition() {
            match definition.strip_prefix(printed.as_str()) {
                Some(rest) => print!("{rest}"),
                None => print!("\n{definition}"),
            }
            std::io::stdout().flush()?;
            printed = definition.to_string();
        }
        if !state.is_generating() || updates.changed().await.is_err() {
            break;
        }
    }
    if !printed.is_empty() {
        println!();
    }

    handle.await.context("definition task panicked")?;
    authoring::ensure_succeeded(orchestrator.snapshot())?;
    Ok(())
}

async fn add_card(
    storage: &Storage,
    settings: &Settings,
    word: String,
    definition: Option<String>,
    generate: bool,
) -> Result<()> {
    let mut fields = CardUpdate {
        definition: definition.filter(|definition| !definition.trim().is_empty()),
        ..CardUpdate::default()
    };
    if generate {
        authoring::fill_missing(settings, &word, &mut fields).await?;
    }
    let Some(definition) = fields.definition else {
        bail!("a definition is required; pass --definition or --generate");
    };

    let card = NewCard::new(word, definition).with_word_type(fields.word_type.flatten());
    let card = storage.insert_card(card).await?;
    info!(card_id = card.id.0, word = %card.word, "card added");
    println!("Added card {}: {}{}", card.id, card.word, display::badge(&card));
    Ok(())
}
