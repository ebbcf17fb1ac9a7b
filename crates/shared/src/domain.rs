use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CardValidationError, UnknownWordType};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CardId);

/// Grammatical category assigned to a vocabulary word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordType {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Pronoun,
    Interjection,
    Determiner,
    Phrase,
}

impl WordType {
    pub const ALL: [WordType; 10] = [
        WordType::Noun,
        WordType::Verb,
        WordType::Adjective,
        WordType::Adverb,
        WordType::Preposition,
        WordType::Conjunction,
        WordType::Pronoun,
        WordType::Interjection,
        WordType::Determiner,
        WordType::Phrase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WordType::Noun => "noun",
            WordType::Verb => "verb",
            WordType::Adjective => "adjective",
            WordType::Adverb => "adverb",
            WordType::Preposition => "preposition",
            WordType::Conjunction => "conjunction",
            WordType::Pronoun => "pronoun",
            WordType::Interjection => "interjection",
            WordType::Determiner => "determiner",
            WordType::Phrase => "phrase",
        }
    }

    /// Canonical lowercase abbreviation shown on word-type badges.
    pub fn abbreviation(self) -> &'static str {
        match self {
            WordType::Noun => "n",
            WordType::Verb => "v",
            WordType::Adjective => "adj",
            WordType::Adverb => "adv",
            WordType::Preposition => "prep",
            WordType::Conjunction => "conj",
            WordType::Pronoun => "pron",
            WordType::Interjection => "interj",
            WordType::Determiner => "det",
            WordType::Phrase => "phr",
        }
    }

    pub fn from_abbreviation(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.abbreviation().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for WordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the category name or its canonical abbreviation, ignoring case
/// and surrounding whitespace.
impl FromStr for WordType {
    type Err = UnknownWordType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .or_else(|| Self::from_abbreviation(trimmed))
            .ok_or_else(|| UnknownWordType(raw.to_string()))
    }
}

/// Which side of a card is currently drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFace {
    Front,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub word: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_type: Option<WordType>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn word_type_abbreviation(&self) -> Option<&'static str> {
        self.word_type.map(WordType::abbreviation)
    }
}

/// A card that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub word: String,
    pub definition: String,
    pub word_type: Option<WordType>,
}

impl NewCard {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
            word_type: None,
        }
    }

    pub fn with_word_type(mut self, word_type: Option<WordType>) -> Self {
        self.word_type = word_type;
        self
    }

    /// Returns a copy with trimmed fields, or the first blank field.
    pub fn validated(&self) -> Result<Self, CardValidationError> {
        Ok(Self {
            word: validate_word(&self.word)?,
            definition: validate_definition(&self.definition)?,
            word_type: self.word_type,
        })
    }
}

/// Partial in-place mutation of a stored card. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUpdate {
    pub word: Option<String>,
    pub definition: Option<String>,
    pub word_type: Option<Option<WordType>>,
}

impl CardUpdate {
    pub fn is_empty(&self) -> bool {
        self.word.is_none() && self.definition.is_none() && self.word_type.is_none()
    }
}

pub fn validate_word(raw: &str) -> Result<String, CardValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CardValidationError::EmptyWord);
    }
    Ok(trimmed.to_string())
}

pub fn validate_definition(raw: &str) -> Result<String, CardValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CardValidationError::EmptyDefinition);
    }
    Ok(trimmed.to_string())
}
