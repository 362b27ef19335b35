//! # Delve
//!
//! Procedural level generation and enemy tactics for a top-down extraction shooter.
//!
//! ## Architecture Overview
//!
//! The crate is the simulation core of a raid: everything that decides *what*
//! a floor looks like and *where* enemies want to go, with rendering, input and
//! physics left to the caller.
//!
//! - **Generation**: seeded BSP dungeon layout, enemy roster and pickups
//! - **Navigation**: walkability, line of sight, A* paths and cover points over a level
//! - **Tactics**: per-enemy goal selection (cover, flank, stand-off) and path following
//! - **Game**: weapons, the per-floor raid state and stash persistence
//!
//! Generation is a pure function of `(floor, base_seed, viewport)`; the same
//! inputs always give the same tiles, start, exit, enemies and pickups.
//!
//! ```
//! use delve::{generate_level, NavGrid};
//!
//! let level = generate_level(1, 42, 800.0, 600.0);
//! assert_eq!(level, generate_level(1, 42, 800.0, 600.0));
//!
//! let nav = NavGrid::new(level);
//! assert!(!nav.cover_points().is_empty());
//! ```

pub mod game;
pub mod generation;
pub mod navigation;
pub mod tactics;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use navigation::{NavGrid, MAX_SIGHT_STEPS};
pub use tactics::*;
pub use utils::*;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Core error type for the Delve engine.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration values cannot be honoured
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A hand-built level map is malformed
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// Generated content failed validation
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Raid state is invalid
    #[error("Invalid raid state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate-wide constants.
pub mod config {
    /// World units per tile
    pub const TILE_SIZE: u32 = 32;

    /// Multiplier mixed into the base seed per floor
    pub const FLOOR_SEED_MIX: u32 = 0x9e37_79b9;

    /// Mixed into the level seed for the enemy roster
    pub const ENCOUNTER_SEED_MIX: u32 = 0x0A53_A9E3;

    /// Mixed into the level seed for pickups
    pub const ITEM_SEED_MIX: u32 = 0x51C0_FFEE;

    /// Hard cap on enemies per floor
    pub const MAX_ENEMIES: usize = 22;

    /// Attempts made by the random walkable tile sampler
    pub const SPAWN_ATTEMPTS: u32 = 9000;

    /// Enemies never spawn closer than this to the player start, in world units
    pub const SPAWN_SAFE_RADIUS: f64 = 160.0;

    /// Player starting health
    pub const PLAYER_MAX_HP: u32 = 100;

    /// How close the player must be to grab a pickup, in world units
    pub const PICKUP_RADIUS: f64 = 40.0;

    /// Time the player must hold the exit zone, in milliseconds
    pub const EXIT_HOLD_MS: u64 = 900;
}

/// Top-level configuration: everything tunable from a config file.
///
/// # Examples
///
/// ```
/// use delve::DelveConfig;
///
/// let config: DelveConfig =
///     serde_json::from_str(r#"{"tactics": {"movement_speed": 200.0}}"#).unwrap();
/// assert_eq!(config.tactics.movement_speed, 200.0);
/// assert_eq!(config.generation.tile_size, 32);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelveConfig {
    /// Dungeon generator tuning
    pub generation: GenerationConfig,
    /// Enemy tactical planner tuning
    pub tactics: TacticalConfig,
}

impl DelveConfig {
    /// Loads a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> DelveResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: DelveConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> DelveResult<()> {
        self.generation.validate()?;
        self.tactics.validate()
    }
}
