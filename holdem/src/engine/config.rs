//! Engine configuration.
//!
//! Values come from [`EngineConfig::default`] and can be overridden through
//! `HOLDEM_*` environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    GameSettings,
    constants::{
        DEFAULT_BIG_BLIND, DEFAULT_MAX_PLAYERS, DEFAULT_SMALL_BLIND, DEFAULT_STARTING_STACK,
        MAX_PLAYERS, MIN_PLAYERS,
    },
    entities::Chips,
};

/// Configuration for one engine (one table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Table name
    pub name: String,

    /// Number of seats
    pub max_players: usize,

    pub small_blind: Chips,

    pub big_blind: Chips,

    /// Stack given to players who join without one
    pub starting_stack: Chips,

    /// Players below this stack sit out (default: the big blind)
    pub min_stack: Option<Chips>,

    /// Seconds a player has to act before being checked or folded; 0 disables
    pub action_timeout_secs: u64,

    /// Bound on queued inbound events
    pub queue_capacity: usize,

    /// Fixed RNG seed for reproducible deals
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "Hold'em".to_string(),
            max_players: DEFAULT_MAX_PLAYERS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            starting_stack: DEFAULT_STARTING_STACK,
            min_stack: None,
            action_timeout_secs: 30,
            queue_capacity: 100,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration fails [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            name: std::env::var("HOLDEM_TABLE_NAME").unwrap_or(defaults.name),
            max_players: parse_env_or("HOLDEM_MAX_PLAYERS", defaults.max_players),
            small_blind: parse_env_or("HOLDEM_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("HOLDEM_BIG_BLIND", defaults.big_blind),
            starting_stack: parse_env_or("HOLDEM_STARTING_STACK", defaults.starting_stack),
            min_stack: defaults.min_stack,
            action_timeout_secs: parse_env_or(
                "HOLDEM_ACTION_TIMEOUT_SECS",
                defaults.action_timeout_secs,
            ),
            queue_capacity: parse_env_or("HOLDEM_QUEUE_CAPACITY", defaults.queue_capacity),
            seed: std::env::var("HOLDEM_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.small_blind == 0 {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_SMALL_BLIND".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.big_blind < self.small_blind {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_BIG_BLIND".to_string(),
                reason: format!(
                    "Must be at least the small blind ({})",
                    self.small_blind
                ),
            });
        }

        if self.starting_stack < self.big_blind {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_STARTING_STACK".to_string(),
                reason: format!("Must cover the big blind ({})", self.big_blind),
            });
        }

        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_MAX_PLAYERS".to_string(),
                reason: format!(
                    "Must be between {MIN_PLAYERS} and {MAX_PLAYERS} (max players with 52-card deck)"
                ),
            });
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "HOLDEM_QUEUE_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                var: "HOLDEM_TABLE_NAME".to_string(),
                hint: "Leave it unset to use the default name".to_string(),
            });
        }

        Ok(())
    }

    /// Timeout for a single decision, if enabled.
    #[must_use]
    pub fn action_timeout(&self) -> Option<Duration> {
        (self.action_timeout_secs > 0).then(|| Duration::from_secs(self.action_timeout_secs))
    }

    #[must_use]
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            min_stack: self.min_stack.unwrap_or(self.big_blind),
            seed: self.seed,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
