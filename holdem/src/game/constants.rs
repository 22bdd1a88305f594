//! Table limits and default stakes.

use super::entities::{Chips, Value};

/// Cards that form a ranked hand.
pub const HAND_SIZE: usize = 5;

pub const HOLE_CARDS: usize = 2;

pub const BOARD_SIZE: usize = 5;

/// Fewest players needed to deal a hand.
pub const MIN_PLAYERS: usize = 2;

/// Every player takes two hole cards and the board burns three and reveals
/// five, so 22 players exactly exhaust a 52-card deck.
pub const MAX_PLAYERS: usize = 22;

pub const DEFAULT_MAX_PLAYERS: usize = 9;

/// Usernames are truncated to this many characters.
pub const MAX_NAME_LENGTH: usize = 32;

pub const ACE: Value = 14;
pub const KING: Value = 13;
pub const QUEEN: Value = 12;
pub const JACK: Value = 11;
pub const FIVE: Value = 5;

pub const DEFAULT_SMALL_BLIND: Chips = 10;
pub const DEFAULT_BIG_BLIND: Chips = 2 * DEFAULT_SMALL_BLIND;
// A player can fold the big blind 50 times before busting.
pub const DEFAULT_STARTING_STACK: Chips = 50 * DEFAULT_BIG_BLIND;
