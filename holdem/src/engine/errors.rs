//! Engine-level error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The room lifecycle phase an engine is in.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum EnginePhase {
    RoomCreated,
    WaitForPlayers,
    WaitForPlayerActions,
    WaitForNextRound,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::RoomCreated => "room created",
            Self::WaitForPlayers => "waiting for players",
            Self::WaitForPlayerActions => "hand in progress",
            Self::WaitForNextRound => "between hands",
        };
        write!(f, "{repr}")
    }
}

/// Malformed input rejected before it reaches the engine queue.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ProtocolError {
    #[error("unknown action kind {0:?}")]
    UnknownAction(String),
    #[error("{kind} doesn't take an amount")]
    UnexpectedAmount { kind: String },
    #[error("invalid amount {0}")]
    InvalidAmount(i64),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine queue is full")]
    QueueFull,
    #[error("engine stopped")]
    EngineStopped,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
