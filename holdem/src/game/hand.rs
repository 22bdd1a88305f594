use std::cmp::Ordering;

use super::{
    constants::HOLE_CARDS,
    entities::{Card, Value},
    errors::GameError,
    functional::{self, HandStrength, Rank},
};

/// A player's pocket plus the cached evaluation against the board.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hand {
    hole: Vec<Card>,
    best: Vec<Card>,
    strength: Option<HandStrength>,
    // Board the cache was computed for.
    evaluated_with: Option<Vec<Card>>,
}

impl Hand {
    pub fn receive(&mut self, card: Card) -> Result<(), GameError> {
        if self.hole.len() >= HOLE_CARDS {
            return Err(GameError::HandFull);
        }
        self.hole.push(card);
        self.invalidate();
        Ok(())
    }

    #[must_use]
    pub fn hole_cards(&self) -> &[Card] {
        &self.hole
    }

    /// Scores the best five of hole plus `community`. Re-evaluating with the
    /// same board returns the cached result.
    pub fn evaluate(&mut self, community: &[Card]) -> &HandStrength {
        if self.evaluated_with.as_deref() != Some(community) || self.strength.is_none() {
            let mut cards = Vec::with_capacity(self.hole.len() + community.len());
            cards.extend_from_slice(&self.hole);
            cards.extend_from_slice(community);
            let (best, strength) = functional::best_of(&cards);
            self.best = best;
            self.strength = Some(strength);
            self.evaluated_with = Some(community.to_vec());
        }
        self.strength.get_or_insert_with(|| functional::score(&[]))
    }

    #[must_use]
    pub fn strength(&self) -> Option<&HandStrength> {
        self.strength.as_ref()
    }

    #[must_use]
    pub fn rank(&self) -> Option<Rank> {
        self.strength.as_ref().map(|s| s.rank)
    }

    #[must_use]
    pub fn tiebreakers(&self) -> &[Value] {
        self.strength
            .as_ref()
            .map(|s| s.tiebreakers.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn best_cards(&self) -> &[Card] {
        &self.best
    }

    /// Compares two evaluated hands. Unevaluated hands lose to evaluated ones.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        self.strength.cmp(&other.strength)
    }

    pub fn reset(&mut self) {
        self.hole.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.best.clear();
        self.strength = None;
        self.evaluated_with = None;
    }
}
