//! One-card-at-a-time study view over cards in creation order.

use shared::domain::{Card, CardId};

use crate::flip::FlipController;

#[derive(Debug, Clone, Default)]
pub struct StudyDeck {
    cards: Vec<Card>,
    index: usize,
    flip: FlipController,
}

impl StudyDeck {
    /// `cards` must already be sorted oldest first.
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards,
            index: 0,
            flip: FlipController::new(false),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn current(&self) -> Option<&Card> {
        self.cards.get(self.index)
    }

    /// One-based position and total, e.g. `(2, 10)`.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current().map(|_| (self.index + 1, self.cards.len()))
    }

    pub fn can_go_previous(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.index + 1 < self.cards.len()
    }

    pub fn next(&mut self) -> bool {
        if !self.can_go_next() {
            return false;
        }
        self.index += 1;
        self.flip.reset();
        true
    }

    pub fn previous(&mut self) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        self.index -= 1;
        self.flip.reset();
        true
    }

    pub fn flip(&self) -> &FlipController {
        &self.flip
    }

    pub fn flip_mut(&mut self) -> &mut FlipController {
        &mut self.flip
    }

    /// Swaps in an edited copy of a card, keeping its place in the deck.
    pub fn replace(&mut self, card: Card) -> bool {
        let Some(slot) = self.cards.iter_mut().find(|existing| existing.id == card.id) else {
            return false;
        };
        *slot = card;
        self.flip.reset();
        true
    }

    /// Removes the card being shown. When the last card goes, the view steps
    /// back to the new last card.
    pub fn remove_current(&mut self) -> Option<CardId> {
        if self.index >= self.cards.len() {
            return None;
        }
        let removed = self.cards.remove(self.index);
        if self.index >= self.cards.len() && self.index > 0 {
            self.index = self.cards.len() - 1;
        }
        self.flip.reset();
        Some(removed.id)
    }
}

#[cfg(test)]
#[path = "tests/study_tests.rs"]
mod tests;
