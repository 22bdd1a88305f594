//! Side pot layering and distribution.
//!
//! The first half checks [`Pot::side_pots`] directly; the second plays
//! stacked hands through [`Game`] and checks who ends up with what.

use holdem::{
    Game, GameSettings, Table,
    entities::{Action, Card, Chips, Deck, Player, Pot, SeatIndex, SidePot, Suit},
};
use proptest::prelude::*;
use std::collections::HashSet;

fn pot_from(contributions: &[(SeatIndex, Chips)]) -> Pot {
    let mut pot = Pot::default();
    for &(seat, amount) in contributions {
        pot.add(seat, amount);
    }
    pot
}

fn contenders(seats: &[SeatIndex]) -> HashSet<SeatIndex> {
    seats.iter().copied().collect()
}

#[test]
fn test_one_short_all_in() {
    // Seat 0 is all-in for 50, seats 1 and 2 put in 100 each.
    let pot = pot_from(&[(0, 50), (1, 100), (2, 100)]);
    let pots = pot.side_pots(&contenders(&[0, 1, 2]));
    assert_eq!(
        pots,
        vec![
            SidePot {
                amount: 150,
                eligible: vec![0, 1, 2]
            },
            SidePot {
                amount: 100,
                eligible: vec![1, 2]
            },
        ]
    );
}

#[test]
fn test_three_all_in_levels() {
    let pot = pot_from(&[(0, 25), (1, 75), (2, 150), (3, 150)]);
    let pots = pot.side_pots(&contenders(&[0, 1, 2, 3]));
    let amounts: Vec<Chips> = pots.iter().map(|p| p.amount).collect();
    assert_eq!(amounts, vec![100, 150, 150]);
    assert_eq!(pots[0].eligible, vec![0, 1, 2, 3]);
    assert_eq!(pots[1].eligible, vec![1, 2, 3]);
    assert_eq!(pots[2].eligible, vec![2, 3]);
}

#[test]
fn test_folded_chips_stay_in_play() {
    // Seat 3 folded after putting in more than the short all-in.
    let pot = pot_from(&[(0, 50), (1, 200), (2, 200), (3, 120)]);
    let pots = pot.side_pots(&contenders(&[0, 1, 2]));
    assert_eq!(pots[0].amount, 200);
    assert_eq!(pots[0].eligible, vec![0, 1, 2]);
    assert_eq!(pots[1].amount, 370);
    assert_eq!(pots[1].eligible, vec![1, 2]);
    assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), pot.total());
}

#[test]
fn test_folded_big_bettor_above_every_contender() {
    // The folder out-bet everyone still in; the excess goes to the top layer.
    let pot = pot_from(&[(0, 30), (1, 30), (2, 500)]);
    let pots = pot.side_pots(&contenders(&[0, 1]));
    assert_eq!(
        pots,
        vec![SidePot {
            amount: 560,
            eligible: vec![0, 1]
        }]
    );
}

proptest! {
    #[test]
    fn test_layers_add_up_to_the_pot(
        amounts in prop::collection::vec(1u32..5000, 2..=9),
        mask in any::<u16>(),
    ) {
        let contributions: Vec<(SeatIndex, Chips)> =
            amounts.iter().copied().enumerate().collect();
        let pot = pot_from(&contributions);
        // At least one contender always remains.
        let mut alive: Vec<SeatIndex> = (0..amounts.len())
            .filter(|seat| mask & (1 << seat) != 0)
            .collect();
        if alive.is_empty() {
            alive.push(0);
        }
        let pots = pot.side_pots(&contenders(&alive));

        prop_assert_eq!(pots.iter().map(|p| p.amount).sum::<Chips>(), pot.total());
        for layer in &pots {
            prop_assert!(layer.amount > 0);
            prop_assert!(!layer.eligible.is_empty());
            prop_assert!(layer.eligible.iter().all(|seat| alive.contains(seat)));
        }
        // Each layer's eligible seats are a subset of the one below.
        for pair in pots.windows(2) {
            prop_assert!(pair[1].eligible.iter().all(|s| pair[0].eligible.contains(s)));
        }
    }
}

fn settings() -> GameSettings {
    GameSettings {
        small_blind: 10,
        big_blind: 20,
        min_stack: 20,
        seed: Some(1),
    }
}

fn seat_table(stacks: &[Chips]) -> Table {
    let mut table = Table::new(6);
    for (seat, &chips) in stacks.iter().enumerate() {
        table
            .add_player(seat, Player::new(seat as u64, format!("p{seat}"), chips))
            .unwrap();
    }
    table
}

#[test]
fn test_short_stack_wins_main_pot_only() {
    use Suit::*;
    // Button 0, small blind 1, big blind 2. Hole cards go to 1, 2, 0 twice.
    // Seat 0 makes aces, seat 1 kings, seat 2 queens on a dry board.
    let deck = Deck::stacked(vec![
        Card(13, Spade),
        Card(12, Spade),
        Card(14, Spade),
        Card(13, Heart),
        Card(12, Heart),
        Card(14, Heart),
        Card(4, Club),
        Card(2, Club),
        Card(7, Diamond),
        Card(9, Club),
        Card(5, Club),
        Card(11, Diamond),
        Card(6, Heart),
        Card(3, Diamond),
    ]);
    let mut table = seat_table(&[100, 400, 250]);
    let mut game = Game::new(settings());
    game.start_hand_with_deck(&mut table, deck).unwrap();

    assert_eq!(game.to_act(), Some(0));
    game.handle_actions(&mut table, 0, Action::AllIn).unwrap();
    game.handle_actions(&mut table, 1, Action::AllIn).unwrap();
    game.handle_actions(&mut table, 2, Action::Call).unwrap();

    // Main pot 300 to seat 0. Side pot 300 (150 each from 1 and 2) to seat 1.
    // Seat 1's unmatched 150 comes back to it as the only one eligible.
    assert!(game.is_hand_over());
    assert_eq!(table.player(0).unwrap().chips, 300);
    assert_eq!(table.player(1).unwrap().chips, 450);
    assert_eq!(table.player(2).unwrap().chips, 0);
    assert_eq!(table.total_chips(), 750);
}

#[test]
fn test_split_pot_returns_unmatched_chips() {
    use Suit::*;
    // Both players play the board straight. Heads-up seat 0 is the button.
    // Hole cards go to 1, 0 twice.
    let deck = Deck::stacked(vec![
        Card(2, Club),
        Card(3, Diamond),
        Card(2, Heart),
        Card(3, Spade),
        Card(4, Club),
        Card(10, Spade),
        Card(11, Heart),
        Card(12, Diamond),
        Card(4, Diamond),
        Card(13, Club),
        Card(5, Heart),
        Card(14, Spade),
    ]);
    let mut table = seat_table(&[105, 100]);
    let mut game = Game::new(settings());
    game.start_hand_with_deck(&mut table, deck).unwrap();

    // Seat 0 shoves 105, seat 1 calls for 100: 205 in the pot, 5 unmatched.
    game.handle_actions(&mut table, 0, Action::AllIn).unwrap();
    game.handle_actions(&mut table, 1, Action::Call).unwrap();

    assert!(game.is_hand_over());
    assert_eq!(table.player(0).unwrap().chips, 105);
    assert_eq!(table.player(1).unwrap().chips, 100);
}
