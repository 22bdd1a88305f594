//! Property-based tests for hand evaluation.
//!
//! Cards are drawn without replacement from a real deck so every generated
//! hand is one that could actually be dealt.

use holdem::{
    entities::{Card, Suit},
    functional::{HandStrength, Rank, argmax, best_of, combinations, score},
};
use proptest::prelude::*;
use std::collections::HashSet;

fn full_deck() -> Vec<Card> {
    (2..=14)
        .flat_map(|value| Suit::ALL.into_iter().map(move |suit| Card(value, suit)))
        .collect()
}

// `n` distinct cards.
fn cards_strategy(n: usize) -> impl Strategy<Value = Vec<Card>> {
    Just(full_deck())
        .prop_shuffle()
        .prop_map(move |deck| deck.into_iter().take(n).collect())
}

fn rotate_suit(suit: Suit) -> Suit {
    match suit {
        Suit::Club => Suit::Spade,
        Suit::Spade => Suit::Diamond,
        Suit::Diamond => Suit::Heart,
        Suit::Heart => Suit::Club,
    }
}

proptest! {
    #[test]
    fn test_best_of_picks_five_of_the_input(cards in cards_strategy(7)) {
        let (best, strength) = best_of(&cards);
        prop_assert_eq!(best.len(), 5);
        let input: HashSet<_> = cards.iter().collect();
        prop_assert!(best.iter().all(|card| input.contains(card)));
        prop_assert_eq!(score(&best), strength);
    }

    #[test]
    fn test_best_of_beats_every_subset(cards in cards_strategy(7)) {
        let (_, best) = best_of(&cards);
        for combo in combinations(cards.len(), 5) {
            let subset: Vec<Card> = combo.iter().map(|&i| cards[i]).collect();
            prop_assert!(score(&subset) <= best);
        }
    }

    #[test]
    fn test_more_cards_never_weaker(cards in cards_strategy(7)) {
        let (_, six) = best_of(&cards[..6]);
        let (_, seven) = best_of(&cards);
        prop_assert!(seven >= six);
    }

    #[test]
    fn test_order_of_cards_is_irrelevant(cards in cards_strategy(7)) {
        let mut reversed = cards.clone();
        reversed.reverse();
        prop_assert_eq!(best_of(&cards).1, best_of(&reversed).1);
    }

    #[test]
    fn test_suits_are_symmetric(cards in cards_strategy(7)) {
        let rotated: Vec<Card> = cards.iter().map(|c| Card(c.0, rotate_suit(c.1))).collect();
        prop_assert_eq!(best_of(&cards).1, best_of(&rotated).1);
    }

    #[test]
    fn test_argmax_finds_every_winner(
        a in cards_strategy(7),
        b in cards_strategy(7),
        c in cards_strategy(7),
    ) {
        let strengths: Vec<HandStrength> = [a, b, c].iter().map(|h| best_of(h).1).collect();
        let refs: Vec<&HandStrength> = strengths.iter().collect();
        let winners = argmax(&refs);
        prop_assert!(!winners.is_empty());
        let max = strengths.iter().max().unwrap();
        for (i, strength) in strengths.iter().enumerate() {
            prop_assert_eq!(winners.contains(&i), strength == max);
        }
    }

    #[test]
    fn test_partial_hands_never_straight_or_flush(cards in cards_strategy(4)) {
        let strength = score(&cards);
        prop_assert!(!matches!(
            strength.rank,
            Rank::Straight | Rank::Flush | Rank::StraightFlush | Rank::RoyalFlush
        ));
    }
}

#[test]
fn test_category_ladder() {
    use Suit::*;
    let hands = [
        vec![Card(2, Club), Card(5, Heart), Card(9, Spade), Card(11, Diamond), Card(13, Club)],
        vec![Card(2, Club), Card(2, Heart), Card(9, Spade), Card(11, Diamond), Card(13, Club)],
        vec![Card(2, Club), Card(2, Heart), Card(9, Spade), Card(9, Diamond), Card(13, Club)],
        vec![Card(2, Club), Card(2, Heart), Card(2, Spade), Card(9, Diamond), Card(13, Club)],
        vec![Card(14, Club), Card(2, Heart), Card(3, Spade), Card(4, Diamond), Card(5, Club)],
        vec![Card(2, Club), Card(3, Heart), Card(4, Spade), Card(5, Diamond), Card(6, Club)],
        vec![Card(2, Club), Card(5, Club), Card(9, Club), Card(11, Club), Card(13, Club)],
        vec![Card(2, Club), Card(2, Heart), Card(2, Spade), Card(9, Diamond), Card(9, Club)],
        vec![Card(2, Club), Card(2, Heart), Card(2, Spade), Card(2, Diamond), Card(9, Club)],
        vec![Card(5, Club), Card(6, Club), Card(7, Club), Card(8, Club), Card(9, Club)],
        vec![Card(10, Club), Card(11, Club), Card(12, Club), Card(13, Club), Card(14, Club)],
    ];
    let strengths: Vec<HandStrength> = hands.iter().map(|h| score(h)).collect();
    for pair in strengths.windows(2) {
        assert!(pair[0] < pair[1], "{:?} should lose to {:?}", pair[0], pair[1]);
    }
    // The wheel is the lowest straight.
    assert_eq!(strengths[4].rank, Rank::Straight);
    assert_eq!(strengths[4].tiebreakers, vec![5]);
}

#[test]
fn test_kickers_decide_equal_pairs() {
    use Suit::*;
    let board = [Card(8, Club), Card(8, Heart), Card(3, Spade), Card(4, Diamond), Card(10, Club)];
    let with = |a: Card, b: Card| {
        let mut cards = board.to_vec();
        cards.extend([a, b]);
        best_of(&cards).1
    };
    let ace_kicker = with(Card(14, Spade), Card(2, Heart));
    let king_kicker = with(Card(13, Spade), Card(2, Diamond));
    assert_eq!(ace_kicker.rank, Rank::OnePair);
    assert!(ace_kicker > king_kicker);

    // The board plays for both: an exact tie.
    let a = with(Card(2, Spade), Card(5, Heart));
    let b = with(Card(2, Club), Card(5, Spade));
    assert_eq!(a, b);
    assert_eq!(argmax(&[&a, &b]), vec![0, 1]);
}
