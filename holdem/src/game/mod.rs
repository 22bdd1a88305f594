//! Hold'em rules: cards, hand evaluation, seats and the per-hand state
//! machine.
//!
//! Nothing in here is async or shared. A [`Table`] owns the seated players
//! and a [`Game`] drives one hand at a time against it; the engine module
//! wraps both behind a single-consumer channel.

pub mod constants;
pub mod entities;
pub mod errors;
pub mod functional;
pub mod hand;
pub mod state_machine;
pub mod table;

pub use errors::GameError;
pub use hand::Hand;
pub use state_machine::{Game, GameSettings, GameState, table_snapshot};
pub use table::{ButtonPositions, Table};
