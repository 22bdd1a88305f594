//! Game-level error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Chips, PlayerStatus, SeatIndex};

/// Errors raised while mutating table or hand state.
///
/// Illegal or out-of-turn actions are reported with these variants and then
/// dropped by the caller; the acting seat keeps its prompt. The structural
/// variants (`DeckExhausted`, `InternalStateError`) abort the current hand.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("not your turn")]
    OutOfTurnAction,
    #[error("invalid action")]
    InvalidAction,
    #[error("raise of ${amount} is below the minimum raise of ${min_raise}")]
    RaiseTooSmall { amount: Chips, min_raise: Chips },
    #[error("need 2+ ready players")]
    NotEnoughPlayers,
    #[error("no hand in progress")]
    HandNotInProgress,
    #[error("seat {0} is occupied")]
    SeatOccupied(SeatIndex),
    #[error("seat {0} is empty")]
    SeatEmpty(SeatIndex),
    #[error("seat {seat} does not exist (table has {slots} seats)")]
    SeatOutOfRange { seat: SeatIndex, slots: usize },
    #[error("player already holds two hole cards")]
    HandFull,
    #[error("illegal status transition {from} -> {to}")]
    InvalidTransition {
        from: PlayerStatus,
        to: PlayerStatus,
    },
    #[error("invalid game state: deck exhausted")]
    DeckExhausted,
    #[error("invalid game state: {0}")]
    InternalStateError(String),
}

impl GameError {
    /// Whether the error means the hand can no longer continue safely.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DeckExhausted | Self::InternalStateError(_) | Self::InvalidTransition { .. }
        )
    }
}
