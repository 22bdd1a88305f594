//! Hand evaluation.
//!
//! Hands of five cards or fewer are scored directly; larger hands are scored
//! by taking the best of every five-card combination.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

use super::{
    constants::{ACE, FIVE, HAND_SIZE},
    entities::{Card, Value},
};

/// Hand categories, weakest first so the derived ordering ranks them.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
            Self::RoyalFlush => "royal flush",
        };
        write!(f, "{repr}")
    }
}

/// A scored hand. Ordering compares the rank first and then the tiebreakers
/// element by element, so equal strengths are exact ties.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct HandStrength {
    pub rank: Rank,
    pub tiebreakers: Vec<Value>,
}

impl Ord for HandStrength {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.tiebreakers.cmp(&other.tiebreakers))
    }
}

impl PartialOrd for HandStrength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HandStrength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.rank)
    }
}

/// Every `k`-sized combination of the indices `0..n`, in lexicographic order.
#[must_use]
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        out.push(indices.clone());
        // Find the rightmost index that can still move right.
        let Some(i) = (0..k).rev().find(|&i| indices[i] != i + n - k) else {
            return out;
        };
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

/// Scores at most five cards. Flushes and straights need all five.
#[must_use]
pub fn score(cards: &[Card]) -> HandStrength {
    let mut counts = [0u8; ACE as usize + 1];
    for card in cards {
        counts[card.0 as usize] += 1;
    }
    // (count, value) sorted by count then value, both descending.
    let mut groups: Vec<(u8, Value)> = counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(value, &count)| (count, value as Value))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let tiebreakers: Vec<Value> = groups.iter().map(|(_, value)| *value).collect();

    if cards.len() == HAND_SIZE {
        let is_flush = cards.iter().all(|card| card.1 == cards[0].1);
        let straight_high = straight_high(&tiebreakers);
        match (is_flush, straight_high) {
            (true, Some(ACE)) => {
                return HandStrength {
                    rank: Rank::RoyalFlush,
                    tiebreakers: vec![ACE],
                };
            }
            (true, Some(high)) => {
                return HandStrength {
                    rank: Rank::StraightFlush,
                    tiebreakers: vec![high],
                };
            }
            (false, Some(high)) => {
                return HandStrength {
                    rank: Rank::Straight,
                    tiebreakers: vec![high],
                };
            }
            (true, None) => {
                return HandStrength {
                    rank: Rank::Flush,
                    tiebreakers,
                };
            }
            (false, None) => {}
        }
    }

    let rank = match (groups.first(), groups.get(1)) {
        (Some((4, _)), _) => Rank::FourOfAKind,
        (Some((3, _)), Some((2, _))) => Rank::FullHouse,
        (Some((3, _)), _) => Rank::ThreeOfAKind,
        (Some((2, _)), Some((2, _))) => Rank::TwoPair,
        (Some((2, _)), _) => Rank::OnePair,
        _ => Rank::HighCard,
    };
    HandStrength { rank, tiebreakers }
}

/// High card of a straight given five distinct values sorted descending.
fn straight_high(values: &[Value]) -> Option<Value> {
    if values.len() != HAND_SIZE {
        return None;
    }
    if values[0] - values[4] == 4 {
        return Some(values[0]);
    }
    // The wheel: the ace plays low.
    if values == [ACE, FIVE, 4, 3, 2] {
        return Some(FIVE);
    }
    None
}

/// The best five-card hand out of `cards`, along with the cards that make it.
/// Fewer than five cards are scored as a partial hand.
#[must_use]
pub fn best_of(cards: &[Card]) -> (Vec<Card>, HandStrength) {
    if cards.len() <= HAND_SIZE {
        return (cards.to_vec(), score(cards));
    }
    let mut best: Option<(Vec<Card>, HandStrength)> = None;
    for combo in combinations(cards.len(), HAND_SIZE) {
        let subset: Vec<Card> = combo.iter().map(|&i| cards[i]).collect();
        let strength = score(&subset);
        if best.as_ref().is_none_or(|(_, b)| strength > *b) {
            best = Some((subset, strength));
        }
    }
    // combinations(n, 5) for n > 5 is never empty.
    best.unwrap_or_else(|| (cards.to_vec(), score(&cards[..HAND_SIZE])))
}

/// Indices of every hand sharing the best strength. Empty input, empty output.
#[must_use]
pub fn argmax(strengths: &[&HandStrength]) -> Vec<usize> {
    let Some(best) = strengths.iter().max() else {
        return Vec::new();
    };
    strengths
        .iter()
        .enumerate()
        .filter(|(_, s)| *s == best)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    fn cards(pairs: &[(Value, Suit)]) -> Vec<Card> {
        pairs.iter().map(|&(v, s)| Card(v, s)).collect()
    }

    #[test]
    fn test_combinations_count() {
        assert_eq!(combinations(7, 5).len(), 21);
        assert_eq!(combinations(6, 5).len(), 6);
        assert_eq!(combinations(5, 5), vec![vec![0, 1, 2, 3, 4]]);
        assert!(combinations(3, 5).is_empty());
    }

    #[test]
    fn test_royal_flush() {
        let hand = cards(&[
            (14, Suit::Spade),
            (13, Suit::Spade),
            (12, Suit::Spade),
            (11, Suit::Spade),
            (10, Suit::Spade),
            (2, Suit::Heart),
            (3, Suit::Club),
        ]);
        let (best, strength) = best_of(&hand);
        assert_eq!(strength.rank, Rank::RoyalFlush);
        assert!(strength.tiebreakers.contains(&ACE));
        assert!(best.iter().all(|c| c.1 == Suit::Spade));
    }

    #[test]
    fn test_wheel_is_five_high_straight() {
        let hand = cards(&[
            (14, Suit::Spade),
            (2, Suit::Heart),
            (3, Suit::Club),
            (4, Suit::Diamond),
            (5, Suit::Spade),
        ]);
        let strength = score(&hand);
        assert_eq!(strength.rank, Rank::Straight);
        assert_eq!(strength.tiebreakers, vec![5]);

        let six_high = score(&cards(&[
            (2, Suit::Heart),
            (3, Suit::Club),
            (4, Suit::Diamond),
            (5, Suit::Spade),
            (6, Suit::Spade),
        ]));
        assert!(six_high > strength);
    }

    #[test]
    fn test_steel_wheel() {
        let strength = score(&cards(&[
            (14, Suit::Heart),
            (2, Suit::Heart),
            (3, Suit::Heart),
            (4, Suit::Heart),
            (5, Suit::Heart),
        ]));
        assert_eq!(strength.rank, Rank::StraightFlush);
        assert_eq!(strength.tiebreakers, vec![5]);
    }

    #[test]
    fn test_full_house_tiebreakers() {
        let strength = score(&cards(&[
            (9, Suit::Heart),
            (9, Suit::Club),
            (9, Suit::Spade),
            (4, Suit::Diamond),
            (4, Suit::Spade),
        ]));
        assert_eq!(strength.rank, Rank::FullHouse);
        assert_eq!(strength.tiebreakers, vec![9, 4]);
    }

    #[test]
    fn test_two_pair_kicker_breaks_tie() {
        let a = score(&cards(&[
            (10, Suit::Heart),
            (10, Suit::Club),
            (6, Suit::Spade),
            (6, Suit::Diamond),
            (13, Suit::Spade),
        ]));
        let b = score(&cards(&[
            (10, Suit::Spade),
            (10, Suit::Diamond),
            (6, Suit::Heart),
            (6, Suit::Club),
            (12, Suit::Spade),
        ]));
        assert_eq!(a.rank, Rank::TwoPair);
        assert_eq!(a.tiebreakers, vec![10, 6, 13]);
        assert!(a > b);
    }

    #[test]
    fn test_partial_hand_scored() {
        let strength = score(&cards(&[(8, Suit::Heart), (8, Suit::Club)]));
        assert_eq!(strength.rank, Rank::OnePair);
        assert_eq!(strength.tiebreakers, vec![8]);

        let (best, strength) = best_of(&cards(&[(3, Suit::Heart), (12, Suit::Club)]));
        assert_eq!(best.len(), 2);
        assert_eq!(strength.rank, Rank::HighCard);
        assert_eq!(strength.tiebreakers, vec![12, 3]);
    }

    #[test]
    fn test_four_cards_never_straight() {
        let strength = score(&cards(&[
            (2, Suit::Heart),
            (3, Suit::Heart),
            (4, Suit::Heart),
            (5, Suit::Heart),
        ]));
        assert_eq!(strength.rank, Rank::HighCard);
    }

    #[test]
    fn test_best_of_picks_flush_over_straight() {
        let hand = cards(&[
            (6, Suit::Heart),
            (7, Suit::Club),
            (8, Suit::Heart),
            (9, Suit::Heart),
            (10, Suit::Spade),
            (2, Suit::Heart),
            (13, Suit::Heart),
        ]);
        let (_, strength) = best_of(&hand);
        assert_eq!(strength.rank, Rank::Flush);
        assert_eq!(strength.tiebreakers, vec![13, 9, 8, 6, 2]);
    }

    #[test]
    fn test_argmax_returns_all_ties() {
        let pair = HandStrength {
            rank: Rank::OnePair,
            tiebreakers: vec![8, 14, 10, 3],
        };
        let high = HandStrength {
            rank: Rank::HighCard,
            tiebreakers: vec![14, 13, 9, 5, 2],
        };
        assert_eq!(argmax(&[&pair, &high, &pair]), vec![0, 2]);
        assert_eq!(argmax(&[&high]), vec![0]);
        assert!(argmax(&[]).is_empty());
    }
}
