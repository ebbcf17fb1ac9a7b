use std::{io::Write, time::Duration};

use anyhow::Result;
use client_core::StudyDeck;
use shared::domain::{Card, CardFace, CardUpdate};
use storage::{SortOrder, Storage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::info;

use crate::{authoring, config::Settings, display};

const FLIP_DURATION: Duration = Duration::from_millis(360);
const FLIP_FRAMES: u32 = 9;

enum Action {
    Flip,
    Next,
    Previous,
    Edit,
    Regenerate,
    Delete,
    Quit,
    Unknown(String),
}

impl Action {
    fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "" | "f" | "flip" => Action::Flip,
            "n" | "next" => Action::Next,
            "p" | "prev" | "previous" => Action::Previous,
            "e" | "edit" => Action::Edit,
            "g" | "generate" => Action::Regenerate,
            "d" | "delete" => Action::Delete,
            "q" | "quit" | "exit" => Action::Quit,
            other => Action::Unknown(other.to_string()),
        }
    }
}

pub async fn run(storage: &Storage, settings: &Settings) -> Result<()> {
    let mut deck = StudyDeck::new(storage.list_cards(SortOrder::Ascending).await?);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if deck.is_empty() {
            println!("No cards to study. Add one with `flashcards add <word>`.");
            return Ok(());
        }
        render(&deck);
        print!("[f]lip  [n]ext  [p]revious  [e]dit  [g]enerate  [d]elete  [q]uit > ");
        std::io::stdout().flush()?;

        let Some(line) = input.next_line().await? else {
            println!();
            return Ok(());
        };

        match Action::parse(&line) {
            Action::Flip => animate_flip(&mut deck).await?,
            Action::Next => {
                if !deck.next() {
                    println!("That was the last card.");
                }
            }
            Action::Previous => {
                if !deck.previous() {
                    println!("This is the first card.");
                }
            }
            Action::Edit => {
                let Some(card) = deck.current().cloned() else {
                    continue;
                };
                let Some(update) = prompt_edit(&card, &mut input).await? else {
                    return Ok(());
                };
                if update.is_empty() {
                    println!("Nothing changed.");
                    continue;
                }
                match authoring::apply_edit(storage, settings, card.id, update, false).await {
                    Ok(card) => {
                        deck.replace(card);
                    }
                    Err(error) => println!("Could not save the edit: {error:#}"),
                }
            }
            Action::Regenerate => {
                let Some(card_id) = deck.current().map(|card| card.id) else {
                    continue;
                };
                println!("Generating a new definition and word type...");
                let update = CardUpdate::default();
                match authoring::apply_edit(storage, settings, card_id, update, true).await {
                    Ok(card) => {
                        deck.replace(card);
                    }
                    Err(error) => println!("Could not regenerate the card: {error:#}"),
                }
            }
            Action::Delete => {
                let Some(card_id) = deck.current().map(|card| card.id) else {
                    continue;
                };
                storage.delete_card(card_id).await?;
                deck.remove_current();
                info!(card_id = card_id.0, "deleted card while studying");
                println!("Deleted card {card_id}.");
            }
            Action::Quit => return Ok(()),
            Action::Unknown(other) => println!("Unknown command '{other}'."),
        }
    }
}

async fn prompt_line<R: AsyncBufRead + Unpin>(
    input: &mut Lines<R>,
    prompt: &str,
) -> Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

/// Asks for a new word and definition; `None` when input ends.
async fn prompt_edit<R: AsyncBufRead + Unpin>(
    card: &Card,
    input: &mut Lines<R>,
) -> Result<Option<CardUpdate>> {
    let Some(word) = prompt_line(input, &format!("Word [{}]: ", card.word)).await? else {
        return Ok(None);
    };
    let Some(definition) =
        prompt_line(input, "Definition (blank keeps the current one): ").await?
    else {
        return Ok(None);
    };
    Ok(Some(edit_from_answers(card, &word, &definition)))
}

/// Blank or unchanged answers leave the field alone.
fn edit_from_answers(card: &Card, word: &str, definition: &str) -> CardUpdate {
    let changed = |answer: &str, current: &str| {
        let answer = answer.trim();
        (!answer.is_empty() && answer != current).then(|| answer.to_string())
    };
    CardUpdate {
        word: changed(word, &card.word),
        definition: changed(definition, &card.definition),
        word_type: None,
    }
}

fn render(deck: &StudyDeck) {
    let (Some(card), Some((index, total))) = (deck.current(), deck.position()) else {
        return;
    };

    println!();
    println!("Card {index} / {total}");
    match deck.flip().face_visible() {
        CardFace::Front => {
            println!("  {}{}", card.word, display::badge(card));
            println!("  (flip to see the definition)");
        }
        CardFace::Back => {
            println!("  {}", card.word);
            for line in card.definition.lines() {
                println!("    {line}");
            }
        }
    }
}

/// Steps the controller from its current orientation to the new target,
/// printing one outline per frame.
async fn animate_flip(deck: &mut StudyDeck) -> Result<()> {
    let Some(card) = deck.current() else {
        return Ok(());
    };
    let word = card.word.clone();

    let flip = deck.flip_mut();
    let start = flip.orientation();
    let target = flip.toggle();
    let mut ticker = tokio::time::interval(FLIP_DURATION / FLIP_FRAMES);

    for frame in 1..=FLIP_FRAMES {
        ticker.tick().await;
        let progress = ease_in_out(f64::from(frame) / f64::from(FLIP_FRAMES));
        flip.set_orientation(start + (target - start) * progress);

        let label = match flip.face_visible() {
            CardFace::Front => word.as_str(),
            CardFace::Back => "definition",
        };
        print!("\r{:<48}", display::flip_frame(flip.orientation(), label));
        std::io::stdout().flush()?;
    }
    println!();
    Ok(())
}

fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
#[path = "tests/study_tests.rs"]
mod tests;
