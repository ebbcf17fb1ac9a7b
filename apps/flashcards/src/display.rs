//! Plain-text rendering of cards and generation results.

use client_core::flip::BACK_ORIENTATION;
use shared::{domain::Card, protocol::WordClassification};

/// Widest the card outline gets while it turns.
const FLIP_FRAME_WIDTH: usize = 24;

pub fn badge(card: &Card) -> String {
    card.word_type_abbreviation()
        .map(|abbreviation| format!(" ({abbreviation})"))
        .unwrap_or_default()
}

/// One row of `list` output.
pub fn card_line(card: &Card) -> String {
    format!(
        "{:>4}  {}{}  {}",
        card.id.0,
        card.word,
        badge(card),
        first_line(&card.definition)
    )
}

pub fn card_details(card: &Card) -> String {
    let word_type = card
        .word_type
        .map(|word_type| format!("{word_type} ({})", word_type.abbreviation()))
        .unwrap_or_else(|| "unclassified".to_string());
    format!(
        "#{} {}\n  type:    {}\n  added:   {}\n  meaning: {}",
        card.id,
        card.word,
        word_type,
        card.created_at.format("%Y-%m-%d %H:%M"),
        card.definition
    )
}

pub fn classification(word: &str, classification: &WordClassification) -> String {
    format!(
        "{word}: {} ({})",
        classification.word_type, classification.abbreviation
    )
}

/// The card outline as seen at `orientation` degrees: full width face-on,
/// a sliver edge-on.
pub fn flip_frame(orientation: f64, label: &str) -> String {
    let turn = (orientation / BACK_ORIENTATION * std::f64::consts::PI).cos().abs();
    let width = ((turn * FLIP_FRAME_WIDTH as f64).round() as usize).max(1);
    let pad = (FLIP_FRAME_WIDTH - width) / 2;
    format!(
        "{}[{}] {:>3.0}° {label}",
        " ".repeat(pad + 2),
        "=".repeat(width),
        orientation
    )
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
#[path = "tests/display_tests.rs"]
mod tests;
