use chrono::{TimeZone, Utc};
use shared::domain::{CardId, WordType};

use super::*;

fn card(word_type: Option<WordType>) -> Card {
    Card {
        id: CardId(7),
        word: "quickly".into(),
        definition: "At a fast speed.\nShe walked quickly to the bus.".into(),
        word_type,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    }
}

#[test]
fn list_row_shows_badge_and_first_definition_line() {
    assert_eq!(
        card_line(&card(Some(WordType::Adverb))),
        "   7  quickly (adv)  At a fast speed."
    );
    assert_eq!(card_line(&card(None)), "   7  quickly  At a fast speed.");
}

#[test]
fn details_spell_out_the_word_type() {
    let details = card_details(&card(Some(WordType::Adverb)));
    assert!(details.starts_with("#7 quickly"));
    assert!(details.contains("type:    adverb (adv)"));
    assert!(details.contains("added:   2024-05-01 09:30"));

    assert!(card_details(&card(None)).contains("unclassified"));
}

#[test]
fn classification_uses_canonical_abbreviation() {
    assert_eq!(
        classification("quickly", &WordClassification::from(WordType::Adverb)),
        "quickly: adverb (adv)"
    );
}

#[test]
fn flip_frame_narrows_toward_edge_on() {
    let face_on = flip_frame(0.0, "quickly");
    let edge_on = flip_frame(90.0, "quickly");
    let count = |frame: &str| frame.matches('=').count();

    assert_eq!(count(&face_on), 24);
    assert_eq!(count(&edge_on), 1);
    assert_eq!(count(&flip_frame(180.0, "quickly")), 24);
    assert!(edge_on.contains(" 90°"));
}
