//! Engine actor message types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::errors::{EnginePhase, ProtocolError};
use crate::game::entities::{Action, Chips, GameSnapshot, PlayerId, SeatIndex};

/// Inbound events. Every state change in a room is one of these.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum EngineEvent {
    /// Seat a player. Without `chips` they get the configured starting stack.
    PlayerJoined {
        seat: SeatIndex,
        id: PlayerId,
        name: String,
        chips: Option<Chips>,
    },

    /// Remove a player; mid-hand they're folded first and removed when the
    /// hand ends.
    PlayerLeft { seat: SeatIndex },

    /// Players are seated, deal the first hand.
    Ready,

    /// Deal the next hand.
    StartGame,

    /// A player's decision, forwarded to the game as is.
    PlayerActed { seat: SeatIndex, action: Action },

    /// Internal: the seat's action clock ran out.
    TimedOut { seat: SeatIndex },
}

/// Messages that can be sent to an engine actor
#[derive(Debug)]
pub enum EngineMessage {
    /// Fire-and-forget event
    Event(EngineEvent),

    /// Event whose outcome the sender waits for
    Request {
        event: EngineEvent,
        response: oneshot::Sender<EngineResponse>,
    },

    /// Current state, with hole cards for `viewer` only
    GetSnapshot {
        viewer: Option<SeatIndex>,
        response: oneshot::Sender<Arc<GameSnapshot>>,
    },

    /// Subscribe to state change notifications
    Subscribe {
        id: u64,
        sender: mpsc::Sender<StateChangeNotification>,
    },

    /// Unsubscribe from state change notifications
    Unsubscribe { id: u64 },
}

/// Notification sent after every state transition, carrying the public
/// snapshot taken once the mutation completed.
#[derive(Debug, Clone)]
pub enum StateChangeNotification {
    /// Action taken, new round, new hand
    StateChanged(Arc<GameSnapshot>),
    /// Player joined or left
    PlayerListChanged(Arc<GameSnapshot>),
    /// Pot awarded, waiting for the next hand
    HandFinished(Arc<GameSnapshot>),
}

impl StateChangeNotification {
    #[must_use]
    pub fn snapshot(&self) -> &Arc<GameSnapshot> {
        match self {
            Self::StateChanged(snapshot)
            | Self::PlayerListChanged(snapshot)
            | Self::HandFinished(snapshot) => snapshot,
        }
    }
}

/// Outcome of an engine event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineResponse {
    /// Operation succeeded
    Success,

    /// Operation failed
    Error(String),

    /// Seat is taken or the player is already seated
    SeatTaken(SeatIndex),

    /// Fewer than two players can cover the minimum stack
    NotEnoughPlayers,

    /// Not your turn
    NotYourTurn,

    /// Invalid action for current game state
    InvalidAction(String),

    /// Event doesn't apply in the current phase
    WrongPhase(EnginePhase),
}

impl EngineResponse {
    /// Check if response is success
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, EngineResponse::Success)
    }

    /// Get error message if response is error
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            EngineResponse::Success => None,
            EngineResponse::Error(msg) => Some(msg.clone()),
            EngineResponse::SeatTaken(seat) => Some(format!("Seat {seat} is taken")),
            EngineResponse::NotEnoughPlayers => Some("Need 2+ ready players".to_string()),
            EngineResponse::NotYourTurn => Some("Not your turn".to_string()),
            EngineResponse::InvalidAction(msg) => Some(format!("Invalid action: {msg}")),
            EngineResponse::WrongPhase(phase) => Some(format!("Not allowed while {phase}")),
        }
    }
}

impl Action {
    /// Parses an action as it arrives off the wire. Kinds are matched
    /// case-insensitively; only `raise` takes an amount, and it's optional.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for unknown kinds, amounts on actions that
    /// don't take one, and negative or oversized amounts.
    pub fn from_wire(kind: &str, amount: Option<i64>) -> Result<Self, ProtocolError> {
        let kind = kind.trim().to_ascii_lowercase();
        let amount = amount
            .map(|a| Chips::try_from(a).map_err(|_| ProtocolError::InvalidAmount(a)))
            .transpose()?;
        let action = match kind.as_str() {
            "fold" => Action::Fold,
            "check" => Action::Check,
            "call" => Action::Call,
            "allin" | "all-in" | "all_in" => Action::AllIn,
            "raise" | "bet" => {
                if amount == Some(0) {
                    return Err(ProtocolError::InvalidAmount(0));
                }
                return Ok(Action::Raise(amount));
            }
            _ => return Err(ProtocolError::UnknownAction(kind)),
        };
        if amount.is_some() {
            return Err(ProtocolError::UnexpectedAmount { kind });
        }
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_parses_kinds() {
        assert_eq!(Action::from_wire("fold", None), Ok(Action::Fold));
        assert_eq!(Action::from_wire(" CHECK ", None), Ok(Action::Check));
        assert_eq!(Action::from_wire("all-in", None), Ok(Action::AllIn));
        assert_eq!(Action::from_wire("raise", None), Ok(Action::Raise(None)));
        assert_eq!(
            Action::from_wire("raise", Some(60)),
            Ok(Action::Raise(Some(60)))
        );
    }

    #[test]
    fn test_from_wire_rejects_garbage() {
        assert_eq!(
            Action::from_wire("shove", None),
            Err(ProtocolError::UnknownAction("shove".to_string()))
        );
        assert_eq!(
            Action::from_wire("raise", Some(-5)),
            Err(ProtocolError::InvalidAmount(-5))
        );
        assert_eq!(
            Action::from_wire("raise", Some(i64::MAX)),
            Err(ProtocolError::InvalidAmount(i64::MAX))
        );
        assert_eq!(
            Action::from_wire("raise", Some(0)),
            Err(ProtocolError::InvalidAmount(0))
        );
        assert_eq!(
            Action::from_wire("call", Some(10)),
            Err(ProtocolError::UnexpectedAmount {
                kind: "call".to_string()
            })
        );
    }

    #[test]
    fn test_response_error_messages() {
        assert!(EngineResponse::Success.is_success());
        assert_eq!(EngineResponse::Success.error_message(), None);
        assert_eq!(
            EngineResponse::NotYourTurn.error_message().as_deref(),
            Some("Not your turn")
        );
        assert!(!EngineResponse::SeatTaken(3).is_success());
    }
}
