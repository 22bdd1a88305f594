//! Room lifecycle phases.
//!
//! Each phase is a `Room<T>` over a phase marker, and transitions consume the
//! room, so a phase can only be left through one of the `From` impls below.
//! [`EngineState`] is the dispatch enum the engine stores.

use enum_dispatch::enum_dispatch;

use super::errors::EnginePhase;
use crate::game::{Game, Table, entities::GameSnapshot, entities::SeatIndex, table_snapshot};

/// Shared behavior of every phase.
#[enum_dispatch]
pub trait RoomState {
    fn phase(&self) -> EnginePhase;
    fn table(&self) -> &Table;
    fn table_mut(&mut self) -> &mut Table;
    fn game(&self) -> Option<&Game>;

    /// The room as seen from `viewer`'s seat.
    #[must_use]
    fn snapshot(&self, viewer: Option<SeatIndex>) -> GameSnapshot {
        match self.game() {
            Some(game) => game.snapshot(self.table(), viewer),
            None => table_snapshot(self.table(), viewer),
        }
    }
}

/// Phase-specific data.
pub trait Phase {
    const PHASE: EnginePhase;

    fn game(&self) -> Option<&Game> {
        None
    }
}

#[derive(Debug)]
pub struct Room<T> {
    pub table: Table,
    pub state: T,
}

impl<T: Phase> RoomState for Room<T> {
    fn phase(&self) -> EnginePhase {
        T::PHASE
    }

    fn table(&self) -> &Table {
        &self.table
    }

    fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    fn game(&self) -> Option<&Game> {
        self.state.game()
    }
}

#[derive(Debug, Default)]
pub struct RoomCreated;

/// Seating players. Keeps the game from earlier hands, if any, so the
/// button keeps rotating.
#[derive(Debug, Default)]
pub struct WaitForPlayers {
    pub game: Option<Game>,
}

#[derive(Debug)]
pub struct WaitForPlayerActions {
    pub game: Game,
}

#[derive(Debug)]
pub struct WaitForNextRound {
    pub game: Game,
}

impl Phase for RoomCreated {
    const PHASE: EnginePhase = EnginePhase::RoomCreated;
}

impl Phase for WaitForPlayers {
    const PHASE: EnginePhase = EnginePhase::WaitForPlayers;

    fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }
}

impl Phase for WaitForPlayerActions {
    const PHASE: EnginePhase = EnginePhase::WaitForPlayerActions;

    fn game(&self) -> Option<&Game> {
        Some(&self.game)
    }
}

impl Phase for WaitForNextRound {
    const PHASE: EnginePhase = EnginePhase::WaitForNextRound;

    fn game(&self) -> Option<&Game> {
        Some(&self.game)
    }
}

impl Room<RoomCreated> {
    #[must_use]
    pub fn new(table: Table) -> Self {
        Self {
            table,
            state: RoomCreated,
        }
    }
}

impl From<Room<RoomCreated>> for Room<WaitForPlayers> {
    fn from(value: Room<RoomCreated>) -> Self {
        Self {
            table: value.table,
            state: WaitForPlayers::default(),
        }
    }
}

impl Room<WaitForPlayers> {
    /// Moves to the betting phase with a hand already dealt by `game`.
    #[must_use]
    pub fn deal(self, game: Game) -> Room<WaitForPlayerActions> {
        Room {
            table: self.table,
            state: WaitForPlayerActions { game },
        }
    }
}

impl From<Room<WaitForPlayerActions>> for Room<WaitForNextRound> {
    fn from(value: Room<WaitForPlayerActions>) -> Self {
        Self {
            table: value.table,
            state: WaitForNextRound {
                game: value.state.game,
            },
        }
    }
}

impl From<Room<WaitForNextRound>> for Room<WaitForPlayerActions> {
    fn from(value: Room<WaitForNextRound>) -> Self {
        Self {
            table: value.table,
            state: WaitForPlayerActions {
                game: value.state.game,
            },
        }
    }
}

impl From<Room<WaitForNextRound>> for Room<WaitForPlayers> {
    fn from(value: Room<WaitForNextRound>) -> Self {
        Self {
            table: value.table,
            state: WaitForPlayers {
                game: Some(value.state.game),
            },
        }
    }
}

/// The engine's current phase.
#[enum_dispatch(RoomState)]
#[derive(Debug)]
pub enum EngineState {
    RoomCreated(Room<RoomCreated>),
    WaitForPlayers(Room<WaitForPlayers>),
    WaitForPlayerActions(Room<WaitForPlayerActions>),
    WaitForNextRound(Room<WaitForNextRound>),
}

// Placeholder left behind while a transition holds the real state.
impl Default for EngineState {
    fn default() -> Self {
        Room::new(Table::new(0)).into()
    }
}
