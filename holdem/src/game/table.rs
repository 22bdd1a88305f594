//! Seat registry and turn order.
//!
//! Seats are stable indices into `0..number_of_slots`. Turn order is always
//! derived with modulo arithmetic through [`Table::seats_after`]; map
//! iteration order is never used for it.

use log::{debug, warn};
use std::collections::HashMap;

use super::{
    constants::MIN_PLAYERS,
    entities::{Chips, Player, PlayerId, PlayerStatus, SeatIndex},
    errors::GameError,
};

/// Seats holding the button and blinds for the current hand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ButtonPositions {
    pub dealer: SeatIndex,
    pub small_blind: SeatIndex,
    pub big_blind: SeatIndex,
}

#[derive(Clone, Debug)]
pub struct Table {
    seats: HashMap<SeatIndex, Player>,
    number_of_slots: usize,
    positions: Option<ButtonPositions>,
}

impl Table {
    #[must_use]
    pub fn new(number_of_slots: usize) -> Self {
        Self {
            seats: HashMap::with_capacity(number_of_slots),
            number_of_slots,
            positions: None,
        }
    }

    #[must_use]
    pub fn number_of_slots(&self) -> usize {
        self.number_of_slots
    }

    #[must_use]
    pub fn positions(&self) -> Option<ButtonPositions> {
        self.positions
    }

    /// Every other seat, clockwise starting left of `from` and wrapping from
    /// the highest slot back to 0. `from` itself is never yielded.
    pub fn seats_after(&self, from: SeatIndex) -> impl Iterator<Item = SeatIndex> + use<> {
        let n = self.number_of_slots;
        (1..n).map(move |offset| (from % n.max(1) + offset) % n)
    }

    /// The first occupied seat after `from` whose player matches `pred`.
    pub fn find_next<F>(&self, from: SeatIndex, pred: F) -> Option<SeatIndex>
    where
        F: Fn(&Player) -> bool,
    {
        self.seats_after(from)
            .find(|seat| self.seats.get(seat).is_some_and(&pred))
    }

    /// The first seat after `from` whose player has one of `statuses`.
    #[must_use]
    pub fn find_next_playable_player(
        &self,
        from: SeatIndex,
        statuses: &[PlayerStatus],
    ) -> Option<SeatIndex> {
        self.find_next(from, |p| statuses.contains(&p.status()))
    }

    pub fn add_player(&mut self, seat: SeatIndex, mut player: Player) -> Result<(), GameError> {
        if seat >= self.number_of_slots {
            warn!(
                "{} can't sit at seat {seat}: table has {} seats",
                player.name, self.number_of_slots
            );
            return Err(GameError::SeatOutOfRange {
                seat,
                slots: self.number_of_slots,
            });
        }
        if self.seats.contains_key(&seat) {
            warn!("{} can't sit at seat {seat}: occupied", player.name);
            return Err(GameError::SeatOccupied(seat));
        }
        player.seat = seat;
        player.reset();
        debug!("{} sat down at seat {seat} with ${}", player.name, player.chips);
        self.seats.insert(seat, player);
        Ok(())
    }

    /// Clears the seat and hands back the player with hand state reset.
    pub fn remove_player(&mut self, seat: SeatIndex) -> Result<Player, GameError> {
        let mut player = self.seats.remove(&seat).ok_or(GameError::SeatEmpty(seat))?;
        player.reset();
        debug!("{} left seat {seat}", player.name);
        Ok(player)
    }

    /// Moves the button to the next `Playing` seat after `from` and places
    /// the blinds behind it. Heads-up, the dealer posts the small blind.
    pub fn determine_next_button_position(
        &mut self,
        from: SeatIndex,
    ) -> Option<ButtonPositions> {
        self.positions = None;
        let playing = [PlayerStatus::Playing];
        let dealer = self.find_next_playable_player(from, &playing)?;
        let small_blind = if self.count_with(|p| p.status() == PlayerStatus::Playing) == 2 {
            dealer
        } else {
            self.find_next_playable_player(dealer, &playing)?
        };
        let big_blind = self.find_next_playable_player(small_blind, &playing)?;
        let positions = ButtonPositions {
            dealer,
            small_blind,
            big_blind,
        };
        debug!("button {dealer}, small blind {small_blind}, big blind {big_blind}");
        self.positions = Some(positions);
        Some(positions)
    }

    /// Sits out anyone below `min_stack` and brings back anyone who can play
    /// again. Passes when at least two players are ready.
    pub fn check_players_readiness(&mut self, min_stack: Chips) -> bool {
        for player in self.seats.values_mut() {
            let next = match player.status() {
                PlayerStatus::Active if player.chips < min_stack.max(1) => PlayerStatus::SatOut,
                PlayerStatus::SatOut if player.chips >= min_stack.max(1) => PlayerStatus::Active,
                _ => continue,
            };
            if let Err(error) = player.set_status(next) {
                warn!("readiness check skipped seat {}: {error}", player.seat);
            }
        }
        self.count_playable_players() >= MIN_PLAYERS
    }

    #[must_use]
    pub fn count_seated_players(&self) -> usize {
        self.seats.len()
    }

    /// Players who could be dealt into the next hand.
    #[must_use]
    pub fn count_playable_players(&self) -> usize {
        self.count_with(|p| p.status() == PlayerStatus::Active)
    }

    pub fn count_with<F>(&self, pred: F) -> usize
    where
        F: Fn(&Player) -> bool,
    {
        self.seats.values().filter(|&p| pred(p)).count()
    }

    #[must_use]
    pub fn player(&self, seat: SeatIndex) -> Option<&Player> {
        self.seats.get(&seat)
    }

    pub fn player_mut(&mut self, seat: SeatIndex) -> Option<&mut Player> {
        self.seats.get_mut(&seat)
    }

    /// Players in seat order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        (0..self.number_of_slots).filter_map(|seat| self.seats.get(&seat))
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.seats.values_mut()
    }

    #[must_use]
    pub fn seat_of(&self, id: PlayerId) -> Option<SeatIndex> {
        self.players().find(|p| p.id == id).map(|p| p.seat)
    }

    #[must_use]
    pub fn open_seats(&self) -> Vec<SeatIndex> {
        (0..self.number_of_slots)
            .filter(|seat| !self.seats.contains_key(seat))
            .collect()
    }

    #[must_use]
    pub fn total_chips(&self) -> u64 {
        self.seats.values().map(|p| u64::from(p.chips)).sum()
    }
}
