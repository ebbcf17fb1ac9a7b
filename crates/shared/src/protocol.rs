//! Structured shapes exchanged with the generation collaborator and the
//! results handed back to presentation code.

use serde::{Deserialize, Serialize};

use crate::{
    domain::WordType,
    error::{GenerationError, UnknownWordType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Define,
    Classify,
    DefineAndClassify,
}

impl GenerationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Define => "define",
            GenerationKind::Classify => "classify",
            GenerationKind::DefineAndClassify => "define_and_classify",
        }
    }

    /// The kind that produces exactly the requested fields, if any.
    pub fn covering(definition: bool, classification: bool) -> Option<Self> {
        match (definition, classification) {
            (true, true) => Some(GenerationKind::DefineAndClassify),
            (true, false) => Some(GenerationKind::Define),
            (false, true) => Some(GenerationKind::Classify),
            (false, false) => None,
        }
    }

    pub fn includes_definition(self) -> bool {
        matches!(
            self,
            GenerationKind::Define | GenerationKind::DefineAndClassify
        )
    }

    pub fn includes_classification(self) -> bool {
        matches!(
            self,
            GenerationKind::Classify | GenerationKind::DefineAndClassify
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDefinition {
    pub definition: String,
}

impl GeneratedDefinition {
    pub fn example() -> Self {
        Self {
            definition: "Feeling good and joyful inside, like when something nice happens to you. People often smile, laugh, or feel excited when they are happy.".to_string(),
        }
    }
}

/// Raw classification as produced by the model, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWordType {
    pub word_type: String,
    #[serde(default)]
    pub abbreviation: String,
}

impl GeneratedWordType {
    pub fn example(word_type: WordType) -> Self {
        Self {
            word_type: word_type.as_str().to_string(),
            abbreviation: word_type.abbreviation().to_string(),
        }
    }

    pub fn examples() -> Vec<Self> {
        [WordType::Noun, WordType::Verb, WordType::Adjective]
            .into_iter()
            .map(Self::example)
            .collect()
    }

    /// Checks the category against the fixed enumeration. The returned
    /// abbreviation is always the canonical one for the category.
    pub fn validate(&self) -> Result<WordClassification, GenerationError> {
        let word_type = self
            .word_type
            .parse::<WordType>()
            .map_err(|UnknownWordType(raw)| {
                GenerationError::validation(format!(
                    "model returned '{raw}', which is not a known word type"
                ))
            })?;
        Ok(WordClassification::from(word_type))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WordClassification {
    pub word_type: WordType,
    pub abbreviation: &'static str,
}

impl From<WordType> for WordClassification {
    fn from(word_type: WordType) -> Self {
        Self {
            word_type,
            abbreviation: word_type.abbreviation(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub definition: Option<String>,
    /// False while `definition` is still streaming or if the stream failed
    /// part way through.
    pub definition_complete: bool,
    pub word_type: Option<WordClassification>,
}
