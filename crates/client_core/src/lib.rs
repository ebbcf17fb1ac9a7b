//! Client-side core of the flashcard app: the card flip state machine, the
//! language-model generation orchestrator and the study deck.

pub mod flip;
pub mod orchestrator;
pub mod prompts;
pub mod study;

pub use flip::FlipController;
pub use orchestrator::{AttemptOutcome, GenerationOrchestrator, GenerationState, Phase};
pub use study::StudyDeck;
