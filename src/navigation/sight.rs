//! # Line of Sight
//!
//! Integer Bresenham raycasts over the tile grid.

use super::NavGrid;
use crate::{Position, WorldPoint};

/// Hard cap on raycast steps; no line on a valid grid comes close.
pub const MAX_SIGHT_STEPS: usize = 4000;

impl NavGrid {
    /// Whether the straight tile line from `from` to `to` avoids every wall.
    ///
    /// Both endpoints are tested too, so a ray starting or ending inside a
    /// wall is blocked. `A -> B` and `B -> A` may differ by one cell near the
    /// ends; that asymmetry belongs to Bresenham and is left alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{generate_level, NavGrid};
    ///
    /// let nav = NavGrid::new(generate_level(1, 42, 800.0, 600.0));
    /// let start = nav.map().start();
    /// assert!(nav.has_line_of_sight(start, start));
    /// ```
    pub fn has_line_of_sight(&self, from: Position, to: Position) -> bool {
        let dx = (to.x - from.x).abs();
        let dy = (to.y - from.y).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let mut err = dx - dy;
        let (mut x, mut y) = (from.x, from.y);

        for _ in 0..MAX_SIGHT_STEPS {
            let cell = Position::new(x, y);
            if self.is_wall(cell) {
                return false;
            }
            if cell == to {
                return true;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
        false
    }

    /// Line of sight between the tiles containing two world points.
    pub fn has_line_of_sight_world(&self, from: WorldPoint, to: WorldPoint) -> bool {
        self.has_line_of_sight(self.to_tile(from), self.to_tile(to))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::map_from_ascii;
    use super::*;

    fn pillar_room() -> NavGrid {
        NavGrid::new(map_from_ascii(&[
            "#########",
            "#S......#",
            "#.......#",
            "#...#...#",
            "#.......#",
            "#......E#",
            "#########",
        ]))
    }

    #[test]
    fn test_clear_lines() {
        let nav = pillar_room();
        assert!(nav.has_line_of_sight(Position::new(1, 1), Position::new(7, 1)));
        assert!(nav.has_line_of_sight(Position::new(1, 1), Position::new(1, 5)));
        assert!(nav.has_line_of_sight(Position::new(1, 5), Position::new(7, 4)));
    }

    #[test]
    fn test_pillar_blocks_sight() {
        let nav = pillar_room();
        assert!(!nav.has_line_of_sight(Position::new(1, 3), Position::new(7, 3)));
        assert!(!nav.has_line_of_sight(Position::new(2, 1), Position::new(6, 5)));
    }

    #[test]
    fn test_walls_at_endpoints_block_sight() {
        let nav = pillar_room();
        assert!(!nav.has_line_of_sight(Position::new(4, 3), Position::new(1, 1)));
        assert!(!nav.has_line_of_sight(Position::new(1, 1), Position::new(0, 1)));
        assert!(!nav.has_line_of_sight(Position::new(1, 1), Position::new(-3, -3)));
    }

    #[test]
    fn test_self_sight_on_floor() {
        let nav = pillar_room();
        assert!(nav.has_line_of_sight(Position::new(3, 3), Position::new(3, 3)));
        assert!(!nav.has_line_of_sight(Position::new(4, 3), Position::new(4, 3)));
    }

    #[test]
    fn test_world_sight_uses_containing_tiles() {
        let nav = pillar_room();
        let a = nav.to_world_center(Position::new(1, 3));
        let b = WorldPoint::new(7.0 * 32.0 + 1.0, 3.0 * 32.0 + 30.0);
        assert!(!nav.has_line_of_sight_world(a, b));
        assert!(nav.has_line_of_sight_world(a, nav.to_world_center(Position::new(3, 3))));
    }
}
