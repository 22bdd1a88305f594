//! Rule-based bots that pick among the actions the engine offers.

use holdem::{
    entities::{Action, ActionChoice, Card, Chips, GameSnapshot, SeatIndex},
    functional::{Rank, best_of},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// How loosely a bot plays. Thresholds are hand strengths in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub label: &'static str,
    pub fold_threshold: f32,
    pub raise_threshold: f32,
    pub aggression: f32,
}

pub const LOOSE: Style = Style {
    label: "loose",
    fold_threshold: 0.08,
    raise_threshold: 0.20,
    aggression: 0.8,
};

pub const BALANCED: Style = Style {
    label: "balanced",
    fold_threshold: 0.12,
    raise_threshold: 0.28,
    aggression: 1.5,
};

pub const TIGHT: Style = Style {
    label: "tight",
    fold_threshold: 0.18,
    raise_threshold: 0.33,
    aggression: 2.5,
};

pub const STYLES: [Style; 3] = [LOOSE, BALANCED, TIGHT];

const BLUFF_FREQUENCY: f64 = 0.05;
const BASE_CALL_PROBABILITY: f32 = 0.3;
const BASE_RAISE_PROBABILITY: f32 = 0.4;
const POT_ODDS_BONUS_THRESHOLD: f32 = 0.25;
const POT_ODDS_BONUS: f32 = 0.2;
const RAISE_VARIANCE: f32 = 0.2;

/// Strength of the best hand made from `hole` and `board`.
#[must_use]
pub fn estimate_strength(hole: &[Card], board: &[Card]) -> f32 {
    if hole.is_empty() {
        return 0.0;
    }
    let mut cards = Vec::with_capacity(hole.len() + board.len());
    cards.extend_from_slice(hole);
    cards.extend_from_slice(board);
    let (_, strength) = best_of(&cards);

    let base = match strength.rank {
        Rank::HighCard => 0.10,
        Rank::OnePair => 0.25,
        Rank::TwoPair => 0.40,
        Rank::ThreeOfAKind => 0.55,
        Rank::Straight => 0.70,
        Rank::Flush => 0.75,
        Rank::FullHouse => 0.85,
        Rank::FourOfAKind => 0.95,
        Rank::StraightFlush | Rank::RoyalFlush => 0.99,
    };
    // Highest tiebreaker nudges strength within a rank.
    let kicker = strength.tiebreakers.first().copied().unwrap_or(0);
    (base + f32::from(kicker) / 14.0 * 0.1).min(1.0)
}

pub struct Bot {
    pub seat: SeatIndex,
    pub style: Style,
    rng: StdRng,
}

impl Bot {
    #[must_use]
    pub fn new(seat: SeatIndex, style: Style, seed: u64) -> Self {
        Self {
            seat,
            style,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks an action for this bot's seat from `view`, which must be the
    /// snapshot as seen by that seat. Only offered actions are returned.
    pub fn decide(&mut self, view: &GameSnapshot) -> Action {
        let Some(me) = view.seat(self.seat) else {
            return Action::Fold;
        };
        let hole = me.cards.as_deref().unwrap_or_default();
        let strength = estimate_strength(hole, &view.community);

        let mut to_call = None;
        let mut min_raise = None;
        let mut can_check = false;
        let mut can_shove = false;
        for choice in &me.suggestions {
            match choice {
                ActionChoice::Call(amount) => to_call = Some(*amount),
                ActionChoice::Raise(amount) => min_raise = Some(*amount),
                ActionChoice::Check => can_check = true,
                ActionChoice::AllIn => can_shove = true,
                ActionChoice::Fold => {}
            }
        }
        let passive = if can_check { Action::Check } else { Action::Fold };

        if strength < self.style.fold_threshold {
            if !can_check && min_raise.is_some() && self.rng.random_bool(BLUFF_FREQUENCY) {
                return Action::Raise(Some(self.raise_size(view.pot, min_raise)));
            }
            return passive;
        }

        if strength < self.style.raise_threshold {
            let Some(call) = to_call else {
                return passive;
            };
            let odds = view.pot as f32 / (view.pot + call).max(1) as f32;
            let bonus = if odds > POT_ODDS_BONUS_THRESHOLD {
                POT_ODDS_BONUS
            } else {
                0.0
            };
            let p = BASE_CALL_PROBABILITY + self.style.aggression / 5.0 + bonus;
            return if self.rng.random_bool(f64::from(p.min(1.0))) {
                Action::Call
            } else {
                Action::Fold
            };
        }

        let p = BASE_RAISE_PROBABILITY + self.style.aggression / 4.0;
        if self.rng.random_bool(f64::from(p.min(1.0))) {
            if min_raise.is_some() {
                return Action::Raise(Some(self.raise_size(view.pot, min_raise)));
            }
            if can_shove {
                return Action::AllIn;
            }
        }
        if to_call.is_some() {
            Action::Call
        } else {
            passive
        }
    }

    /// Pot-sized raise scaled by aggression, never below the minimum. The
    /// engine turns a raise the stack can't cover into an all-in.
    fn raise_size(&mut self, pot: Chips, min_raise: Option<Chips>) -> Chips {
        let min_raise = min_raise.unwrap_or(1);
        let multiplier = match self.style.aggression {
            x if x < 1.0 => 0.5,
            x if x < 2.0 => 0.75,
            _ => 1.0,
        };
        let variance = self.rng.random_range(-RAISE_VARIANCE..=RAISE_VARIANCE);
        let size = (pot as f32 * multiplier * (1.0 + variance)) as Chips;
        size.max(min_raise)
    }
}
