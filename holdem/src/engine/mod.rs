//! Room lifecycle and the single-consumer engine around a table.
//!
//! ## Architecture
//!
//! A [`GameEngine`] owns the table and the game. It moves through
//! `RoomCreated -> WaitForPlayers -> WaitForPlayerActions -> WaitForNextRound`
//! on [`EngineEvent`]s, all applied through [`GameEngine::handle`].
//! [`GameEngine::start_engine`] moves it onto a Tokio task that drains a
//! bounded mpsc queue; callers talk to it through the cloneable
//! [`EngineHandle`] and get `Arc` snapshots back.
//!
//! ## Example
//!
//! ```no_run
//! use holdem::engine::{EngineConfig, GameEngine};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = GameEngine::new(EngineConfig::default())?;
//! let (task, handle) = engine.start_engine();
//! handle.player_join(0, 1, "alice", None)?;
//! handle.player_join(1, 2, "bob", None)?;
//! handle.ready()?;
//! let snapshot = handle.snapshot_for(0).await?;
//! println!("{}", serde_json::to_string(&*snapshot)?);
//! handle.stop_engine();
//! let _engine = task.await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod messages;
pub mod room;
pub mod states;

pub use actor::{EngineActor, EngineHandle};
pub use config::{ConfigError, EngineConfig};
pub use errors::{EngineError, EnginePhase, ProtocolError};
pub use messages::{EngineEvent, EngineMessage, EngineResponse, StateChangeNotification};
pub use room::GameEngine;
