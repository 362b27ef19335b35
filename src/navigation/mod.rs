//! # Navigation Module
//!
//! Read-only queries over one generated level: walkability, tile/world
//! conversion, neighbours, line of sight, shortest paths and cover points.
//!
//! A `NavGrid` is built once per level and shared by every enemy's planning
//! pass. Its only derived state is the cover-point cache, filled on first use;
//! all queries are pure functions of the underlying `LevelMap`, so the grid
//! is safe to read from several threads at once.

pub mod pathfinding;
pub mod sight;

pub use self::pathfinding::*;
pub use sight::*;

use crate::{LevelMap, Position, Tile, WorldPoint};
use std::sync::OnceLock;

/// Query layer over a `LevelMap`.
///
/// # Examples
///
/// ```
/// use delve::{generate_level, NavGrid};
///
/// let nav = NavGrid::new(generate_level(1, 42, 800.0, 600.0));
/// let start = nav.map().start();
/// assert!(nav.is_walkable(start));
/// assert!(!nav.find_path(start, nav.map().exit()).is_empty());
/// ```
#[derive(Debug)]
pub struct NavGrid {
    map: LevelMap,
    cover_points: OnceLock<Vec<WorldPoint>>,
}

impl Clone for NavGrid {
    fn clone(&self) -> Self {
        Self::new(self.map.clone())
    }
}

impl NavGrid {
    /// Wraps a level.
    pub fn new(map: LevelMap) -> Self {
        Self {
            map,
            cover_points: OnceLock::new(),
        }
    }

    /// The underlying level.
    pub fn map(&self) -> &LevelMap {
        &self.map
    }

    /// Width in tiles.
    pub fn width(&self) -> i32 {
        self.map.width() as i32
    }

    /// Height in tiles.
    pub fn height(&self) -> i32 {
        self.map.height() as i32
    }

    /// World units per tile.
    pub fn tile_size(&self) -> f64 {
        self.map.tile_size() as f64
    }

    /// True off the grid or on a wall tile.
    ///
    /// Treating out-of-bounds as wall is what keeps raycasts and neighbour
    /// scans from ever indexing outside the tile buffer.
    pub fn is_wall(&self, pos: Position) -> bool {
        self.map.tile(pos).map_or(true, |t| t == Tile::Wall)
    }

    /// True only on an in-bounds floor tile.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.map.tile(pos).map_or(false, Tile::is_floor)
    }

    /// World-space centre of a tile.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{generate_level, NavGrid, Position, WorldPoint};
    ///
    /// let nav = NavGrid::new(generate_level(1, 1, 800.0, 600.0));
    /// assert_eq!(nav.to_world_center(Position::new(2, 3)), WorldPoint::new(80.0, 112.0));
    /// ```
    pub fn to_world_center(&self, pos: Position) -> WorldPoint {
        let ts = self.tile_size();
        WorldPoint::new(
            pos.x as f64 * ts + ts / 2.0,
            pos.y as f64 * ts + ts / 2.0,
        )
    }

    /// The tile containing a world point (floor division, so negative
    /// coordinates map to negative tiles).
    pub fn to_tile(&self, point: WorldPoint) -> Position {
        let ts = self.tile_size();
        Position::new((point.x / ts).floor() as i32, (point.y / ts).floor() as i32)
    }

    /// Walkable orthogonal neighbours in east, west, south, north order.
    pub fn neighbors4(&self, pos: Position) -> Vec<Position> {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|p| self.is_walkable(*p))
            .collect()
    }

    /// Whether a walkable tile touches at least one wall orthogonally.
    pub fn is_cover_tile(&self, pos: Position) -> bool {
        self.is_walkable(pos)
            && pos
                .cardinal_adjacent_positions()
                .iter()
                .any(|p| self.is_wall(*p))
    }

    /// Scans the interior in row-major order for cover tiles.
    ///
    /// The outer ring is skipped; it is always wall.
    pub fn compute_cover_tiles(&self) -> Vec<Position> {
        let mut tiles = Vec::new();
        for y in 1..self.height() - 1 {
            for x in 1..self.width() - 1 {
                let pos = Position::new(x, y);
                if self.is_cover_tile(pos) {
                    tiles.push(pos);
                }
            }
        }
        tiles
    }

    /// World-space centres of every cover tile, in row-major order.
    pub fn compute_cover_points(&self) -> Vec<WorldPoint> {
        self.compute_cover_tiles()
            .into_iter()
            .map(|p| self.to_world_center(p))
            .collect()
    }

    /// Cached cover points, computed on first access.
    pub fn cover_points(&self) -> &[WorldPoint] {
        self.cover_points.get_or_init(|| {
            let points = self.compute_cover_points();
            log::debug!("Computed {} cover points", points.len());
            points
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::map_from_ascii;
    use super::*;

    fn room() -> NavGrid {
        NavGrid::new(map_from_ascii(&[
            "#######",
            "#S....#",
            "#..#..#",
            "#....E#",
            "#######",
        ]))
    }

    #[test]
    fn test_wall_and_walkable_are_exclusive() {
        let nav = room();
        for y in -2..7 {
            for x in -2..9 {
                let pos = Position::new(x, y);
                if nav.map().in_bounds(pos) {
                    assert_ne!(nav.is_wall(pos), nav.is_walkable(pos));
                } else {
                    assert!(nav.is_wall(pos));
                    assert!(!nav.is_walkable(pos));
                }
            }
        }
    }

    #[test]
    fn test_coordinate_round_trip() {
        let nav = room();
        for y in 0..5 {
            for x in 0..7 {
                let pos = Position::new(x, y);
                assert_eq!(nav.to_tile(nav.to_world_center(pos)), pos);
            }
        }
        assert_eq!(nav.to_tile(WorldPoint::new(-0.5, 31.9)), Position::new(-1, 0));
        assert_eq!(nav.to_tile(WorldPoint::new(32.0, 64.0)), Position::new(1, 2));
    }

    #[test]
    fn test_neighbors_are_filtered_and_ordered() {
        let nav = room();
        assert_eq!(
            nav.neighbors4(Position::new(2, 2)),
            vec![Position::new(1, 2), Position::new(2, 3), Position::new(2, 1)]
        );
        assert_eq!(
            nav.neighbors4(Position::new(1, 1)),
            vec![Position::new(2, 1), Position::new(1, 2)]
        );
    }

    #[test]
    fn test_cover_tiles() {
        let nav = room();
        let cover = nav.compute_cover_tiles();
        // Every floor tile here touches either the ring or the pillar.
        assert_eq!(cover.len(), nav.map().floor_count());
        assert!(cover.contains(&Position::new(2, 2)));
        assert!(cover.contains(&Position::new(1, 1)));
        assert!(cover.iter().all(|p| nav.is_cover_tile(*p)));
        // Row-major order.
        let mut sorted = cover.clone();
        sorted.sort_by_key(|p| (p.y, p.x));
        assert_eq!(cover, sorted);
    }

    #[test]
    fn test_open_interior_tile_is_not_cover() {
        let nav = NavGrid::new(map_from_ascii(&[
            "#####",
            "#S..#",
            "#...#",
            "#..E#",
            "#####",
        ]));
        assert!(!nav.is_cover_tile(Position::new(2, 2)));
        assert_eq!(nav.compute_cover_tiles().len(), 8);
    }

    #[test]
    fn test_cover_points_cached() {
        let nav = room();
        let first = nav.cover_points().as_ptr();
        let second = nav.cover_points().as_ptr();
        assert_eq!(first, second);
        assert_eq!(nav.cover_points(), nav.compute_cover_points().as_slice());
    }
}
