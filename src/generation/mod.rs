//! # Generation Module
//!
//! Procedural content generation for raid floors: the dungeon layout, the
//! enemy roster and the pickups scattered through it.
//!
//! Every generator is a pure function of its input. The dungeon derives its
//! own seed from the floor index and base seed; enemies and pickups derive
//! theirs from the finished map's seed, so one `(floor, base_seed, viewport)`
//! triple fixes the whole floor.

pub mod dungeon;
pub mod encounters;
pub mod items;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;

use crate::navigation::NavGrid;
use crate::{DelveError, DelveResult, Position, WorldPoint, XorShift32};
use pathfinding::prelude::bfs_reach;
use serde::{Deserialize, Serialize};

/// Tuning for the BSP dungeon generator.
///
/// The defaults reproduce the reference layouts; every field can be
/// overridden from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// World units per tile
    pub tile_size: u32,
    /// Tiles added to the viewport width before clamping
    pub width_padding: u32,
    /// Tiles added to the viewport height before clamping
    pub height_padding: u32,
    /// Grid width clamp in tiles
    pub min_width: u32,
    pub max_width: u32,
    /// Grid height clamp in tiles
    pub min_height: u32,
    pub max_height: u32,
    /// Upper bound on BSP split iterations
    pub max_split_attempts: u32,
    /// Minimum leaf side as a fraction of the smaller grid side, then clamped
    pub min_leaf_fraction: f64,
    pub min_leaf_clamp: (i32, i32),
    /// Leaves with a side above this threshold keep being split
    pub max_leaf_fraction: f64,
    pub max_leaf_clamp: (i32, i32),
    /// Split point window along the split axis: `start + r * span`
    pub split_start: f64,
    pub split_span: f64,
    /// Room side as a fraction of its leaf: `start + r * span`
    pub room_fraction_start: f64,
    pub room_fraction_span: f64,
    /// Smallest room side before the leaf margin is applied
    pub min_room_side: i32,
    /// Pillars per room are drawn from `0..pillar_choices`
    pub pillar_choices: u32,
    /// Random room centres sampled when choosing the exit
    pub exit_samples: u32,
    /// Required start-exit Manhattan distance as a fraction of `width + height`
    pub exit_distance_fraction: f64,
    /// Half-size of the square cleared around the exit (1 gives 3x3)
    pub exit_clearing_radius: i32,
}

impl GenerationConfig {
    /// Creates the default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new();
    /// assert_eq!(config.tile_size, 32);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new() -> Self {
        Self {
            tile_size: crate::config::TILE_SIZE,
            width_padding: 26,
            height_padding: 18,
            min_width: 52,
            max_width: 92,
            min_height: 34,
            max_height: 64,
            max_split_attempts: 140,
            min_leaf_fraction: 0.18,
            min_leaf_clamp: (10, 16),
            max_leaf_fraction: 0.30,
            max_leaf_clamp: (18, 26),
            split_start: 0.35,
            split_span: 0.30,
            room_fraction_start: 0.55,
            room_fraction_span: 0.25,
            min_room_side: 6,
            pillar_choices: 3,
            exit_samples: 50,
            exit_distance_fraction: 0.35,
            exit_clearing_radius: 1,
        }
    }

    /// Rejects configurations the generator cannot honour.
    pub fn validate(&self) -> DelveResult<()> {
        let fail = |msg: String| Err(DelveError::InvalidConfig(msg));

        if self.tile_size == 0 {
            return fail("tile_size must be positive".to_string());
        }
        if self.min_width > self.max_width || self.min_height > self.max_height {
            return fail(format!(
                "grid clamp inverted: width [{}, {}], height [{}, {}]",
                self.min_width, self.max_width, self.min_height, self.max_height
            ));
        }
        // Border plus one leaf margin plus a minimal room on both sides.
        if self.min_width < 12 || self.min_height < 12 {
            return fail("grid must be at least 12x12 tiles".to_string());
        }
        if self.min_leaf_clamp.0 > self.min_leaf_clamp.1
            || self.max_leaf_clamp.0 > self.max_leaf_clamp.1
        {
            return fail("leaf clamp inverted".to_string());
        }
        if self.min_leaf_clamp.0 < self.min_room_side + 2 {
            return fail(format!(
                "minimum leaf {} cannot hold a room of side {}",
                self.min_leaf_clamp.0, self.min_room_side
            ));
        }
        for (name, value) in [
            ("split_start", self.split_start),
            ("split_span", self.split_span),
            ("room_fraction_start", self.room_fraction_start),
            ("room_fraction_span", self.room_fraction_span),
            ("exit_distance_fraction", self.exit_distance_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("{} must lie in [0, 1], got {}", name, value));
            }
        }
        if self.exit_clearing_radius < 0 {
            return fail("exit_clearing_radius must not be negative".to_string());
        }
        Ok(())
    }

    /// Grid dimensions in tiles for a viewport in world units.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new();
    /// assert_eq!(config.grid_dimensions(800.0, 600.0), (52, 37));
    /// assert_eq!(config.grid_dimensions(10_000.0, 10_000.0), (92, 64));
    /// ```
    pub fn grid_dimensions(&self, viewport_width: f64, viewport_height: f64) -> (u32, u32) {
        let tiles = |extent: f64| -> u32 {
            let t = (extent.max(0.0) / self.tile_size as f64).ceil();
            t.min(u32::MAX as f64) as u32
        };
        let width = tiles(viewport_width)
            .saturating_add(self.width_padding)
            .clamp(self.min_width, self.max_width);
        let height = tiles(viewport_height)
            .saturating_add(self.height_padding)
            .clamp(self.min_height, self.max_height);
        (width, height)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// An axis-aligned rectangle of tiles, used for BSP leaves and rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Centre tile, rounding towards the top-left.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Position, Rect};
    ///
    /// assert_eq!(Rect::new(5, 5, 10, 7).center(), Position::new(10, 8));
    /// ```
    pub fn center(&self) -> Position {
        Position::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Tile area.
    pub fn area(&self) -> i32 {
        self.w * self.h
    }

    /// Whether the two rectangles share at least one tile.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x >= other.x + other.w
            || other.x >= self.x + self.w
            || self.y >= other.y + other.h
            || other.y >= self.y + self.h)
    }
}

/// What to generate a dungeon for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelRequest {
    /// Floor index, 1-based in play
    pub floor: u32,
    /// Seed shared by every floor of a run
    pub base_seed: u32,
    /// Viewport width in world units, used only to size the grid
    pub viewport_width: f64,
    /// Viewport height in world units
    pub viewport_height: f64,
}

impl LevelRequest {
    /// Creates a request.
    pub fn new(floor: u32, base_seed: u32, viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            floor,
            base_seed,
            viewport_width,
            viewport_height,
        }
    }

    /// The per-floor seed: `base_seed ^ (floor * 0x9e3779b9)` in 32-bit arithmetic.
    pub fn level_seed(&self) -> u32 {
        self.base_seed ^ self.floor.wrapping_mul(crate::config::FLOOR_SEED_MIX)
    }
}

/// Trait for procedural generators.
///
/// Generation itself never fails; the output is always usable, if sometimes
/// degenerate. `validate` is the explicit, fallible check for callers that
/// want to reject degenerate output.
pub trait Generator {
    /// What the generator consumes.
    type Input: ?Sized;
    /// What the generator produces.
    type Output;

    /// Generates content for `input`.
    fn generate(&self, input: &Self::Input) -> Self::Output;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &Self::Output) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Number of floor tiles reachable from `from` over 4-connected floor.
    pub fn reachable_floor_count(nav: &NavGrid, from: Position) -> usize {
        if !nav.is_walkable(from) {
            return 0;
        }
        bfs_reach(from, |p| nav.neighbors4(*p)).count()
    }

    /// Draws random tiles until one is walkable and at least the spawn safe
    /// radius from the player start, returning its centre.
    ///
    /// Falls back to the start tile's centre after the attempt budget runs out.
    pub fn random_walkable_point(nav: &NavGrid, rng: &mut XorShift32) -> WorldPoint {
        let start = nav.to_world_center(nav.map().start());
        let width = nav.map().width() as usize;
        let height = nav.map().height() as usize;
        for _ in 0..crate::config::SPAWN_ATTEMPTS {
            let x = rng.index(width) as i32;
            let y = rng.index(height) as i32;
            let tile = Position::new(x, y);
            if !nav.is_walkable(tile) {
                continue;
            }
            let point = nav.to_world_center(tile);
            if point.distance(start) < crate::config::SPAWN_SAFE_RADIUS {
                continue;
            }
            return point;
        }
        start
    }

    /// Validates that a level has floor and that its exit is reachable from its start.
    pub fn validate_level(nav: &NavGrid) -> DelveResult<()> {
        let map = nav.map();
        if map.floor_count() == 0 {
            return Err(DelveError::GenerationFailed(
                "Level has no floor tiles".to_string(),
            ));
        }
        for (label, pos) in [("start", map.start()), ("exit", map.exit())] {
            if !nav.is_walkable(pos) {
                return Err(DelveError::GenerationFailed(format!(
                    "{} {:?} is not a floor tile",
                    label, pos
                )));
            }
        }

        let exit = map.exit();
        let reachable = bfs_reach(map.start(), |p| nav.neighbors4(*p)).any(|p| p == exit);
        if !reachable {
            return Err(DelveError::GenerationFailed(format!(
                "exit {:?} is not reachable from start {:?}",
                exit,
                map.start()
            )));
        }
        Ok(())
    }
}
