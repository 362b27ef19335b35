//! # Game Module
//!
//! Level data, weapons, persistence and the per-floor raid state.
//!
//! This module contains the data the rest of Delve is built on:
//! - Tile and world coordinates
//! - The immutable generated `LevelMap`
//! - Weapon timers consumed as opaque gates by the tactical layer
//! - Stash persistence and the raid tick loop

pub mod persistence;
pub mod state;
pub mod weapons;
pub mod world;

pub use persistence::*;
pub use state::*;
pub use weapons::*;
pub use world::*;

use serde::{Deserialize, Serialize};

/// A tile coordinate on the level grid.
///
/// # Examples
///
/// ```
/// use delve::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.cardinal_adjacent_positions();
/// assert_eq!(adjacent.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Returns the 4 orthogonal neighbours in east, west, south, north order.
    ///
    /// The order is part of the pathfinder's deterministic tie-break.
    pub fn cardinal_adjacent_positions(self) -> [Position; 4] {
        [
            Position::new(self.x + 1, self.y),
            Position::new(self.x - 1, self.y),
            Position::new(self.x, self.y + 1),
            Position::new(self.x, self.y - 1),
        ]
    }

    /// Whether `other` is exactly one orthogonal step away.
    pub fn is_cardinal_neighbor(self, other: Position) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// A point (or direction) in continuous world space.
///
/// World units are the renderer's pixels: one tile spans `tile_size` units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    /// Creates a new world point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Euclidean distance to another point.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::WorldPoint;
    ///
    /// let a = WorldPoint::new(0.0, 0.0);
    /// let b = WorldPoint::new(3.0, 4.0);
    /// assert_eq!(a.distance(b), 5.0);
    /// ```
    pub fn distance(self, other: WorldPoint) -> f64 {
        (self - other).length()
    }

    /// Length of this point treated as a vector.
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length vector.
    pub fn normalized(self) -> WorldPoint {
        let len = self.length();
        if len > 0.0 {
            WorldPoint::new(self.x / len, self.y / len)
        } else {
            WorldPoint::zero()
        }
    }

    /// Bearing from `self` towards `other` in radians (`atan2` convention).
    pub fn bearing_to(self, other: WorldPoint) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Scales the vector by `factor`.
    pub fn scale(self, factor: f64) -> WorldPoint {
        WorldPoint::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for WorldPoint {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for WorldPoint {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}
