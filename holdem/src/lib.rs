//! # Holdem
//!
//! A server-authoritative Texas Hold'em engine. It seats players, enforces
//! betting legality, deals, evaluates hands and awards pots, including
//! layered side pots.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, hand evaluation, the seat registry and the per-hand
//!   state machine
//! - [`engine`]: Room lifecycle FSM and the async single-consumer actor that
//!   serializes every event
//!
//! ## Example
//!
//! ```
//! use holdem::{EngineConfig, EngineResponse, GameEngine, entities::Action};
//!
//! let mut engine = GameEngine::new(EngineConfig::default()).unwrap();
//! engine.player_join(0, 1, "alice", Some(1000));
//! engine.player_join(1, 2, "bob", Some(1000));
//! assert_eq!(engine.ready(), EngineResponse::Success);
//!
//! let to_act = engine.game().and_then(|g| g.to_act()).unwrap();
//! assert_eq!(engine.player_action(to_act, Action::Call), EngineResponse::Success);
//! ```

/// Room lifecycle and the event-driven engine.
pub mod engine;
pub use engine::{
    EngineConfig, EngineError, EngineEvent, EngineHandle, EnginePhase, EngineResponse, GameEngine,
    ProtocolError, StateChangeNotification,
};

/// Core game logic, entities, and hand evaluation.
pub mod game;
pub use game::{
    Game, GameError, GameSettings, Table,
    constants::{self, MAX_PLAYERS},
    entities, functional,
};

/// Serializes a snapshot for the transport layer.
///
/// # Errors
///
/// Returns error if serialization fails.
pub fn snapshot_to_json(snapshot: &entities::GameSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}
