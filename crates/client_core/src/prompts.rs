use generation::GenerationRequest;
use serde_json::Value;
use shared::protocol::{GeneratedDefinition, GeneratedWordType};

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|line| line.to_string()).collect()
}

fn example_value<T: serde::Serialize>(example: T) -> Value {
    serde_json::to_value(example).unwrap_or(Value::Null)
}

pub fn definition_request(word: &str) -> GenerationRequest {
    GenerationRequest {
        instructions: lines(&[
            "You are a helpful vocabulary assistant.",
            "Provide detailed, beginner-friendly definitions.",
            "Use 2-3 sentences that explain meaning, context, and usage.",
            "Avoid using complex words in your definitions.",
            "Reply with a JSON object that has a single \"definition\" string field.",
        ]),
        prompt: vec![
            format!("Define the word '{word}' in simple, beginner-friendly language."),
            "Here is an example of the format:".to_string(),
        ],
        examples: vec![example_value(GeneratedDefinition::example())],
    }
}

pub fn classification_request(word: &str) -> GenerationRequest {
    GenerationRequest {
        instructions: lines(&[
            "You are a grammar expert.",
            "Classify words into their grammatical categories.",
            "For compound words or phrases, identify the primary grammatical function.",
            "The wordType must be exactly one of: noun, verb, adjective, adverb, preposition, conjunction, pronoun, interjection, determiner, or phrase.",
            "The abbreviation must be the standard one: n, v, adj, adv, prep, conj, pron, interj, det, phr.",
            "Reply with a JSON object with \"wordType\" and \"abbreviation\" string fields.",
        ]),
        prompt: vec![
            format!("What is the grammatical word type of '{word}'?"),
            "Examples:".to_string(),
        ],
        examples: GeneratedWordType::examples()
            .into_iter()
            .map(example_value)
            .collect(),
    }
}
