//! # Dungeon Generation
//!
//! Binary space partitioning layout generation for raid floors.
//!
//! The generator:
//! 1. Splits the grid interior into leaves until none exceeds the maximum leaf size
//! 2. Carves one room with a few cover pillars into every leaf large enough
//! 3. Stitches consecutive rooms together with 3-wide L-shaped corridors
//! 4. Places the start in a random room and the exit in a distant one
//!
//! The outer ring of tiles is never carved, so every level is closed.

use crate::generation::{utils, GenerationConfig, Generator, LevelRequest, Rect};
use crate::navigation::NavGrid;
use crate::utils::{clamp_low, clamp_low_i32, XorShift32};
use crate::{DelveResult, LevelMap, Position, Tile};

/// Width of the permanent wall ring around the grid.
const BORDER: i32 = 1;

/// Mutable tile buffer used while a level is being carved.
///
/// Every write is bounds-checked; out-of-range cells are skipped.
#[derive(Debug, Clone)]
struct Canvas {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as i32,
            height: height as i32,
            tiles: vec![Tile::Wall; width as usize * height as usize],
        }
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if self.in_bounds(x, y) {
            self.tiles[(y * self.width + x) as usize] = tile;
        }
    }

    fn carve_rect(&mut self, rect: &Rect) {
        for y in rect.y..rect.y + rect.h {
            for x in rect.x..rect.x + rect.w {
                self.set(x, y, Tile::Floor);
            }
        }
    }

    /// Carves a straight run from `from` to `to`, widened by one tile on each
    /// side perpendicular to travel. The first cell is not widened.
    fn carve_corridor(&mut self, from: Position, to: Position) {
        let dx = (to.x - from.x).signum();
        let dy = (to.y - from.y).signum();
        let (mut x, mut y) = (from.x, from.y);
        self.set(x, y, Tile::Floor);

        while x != to.x || y != to.y {
            if x != to.x {
                x += dx;
            }
            if y != to.y {
                y += dy;
            }
            self.set(x, y, Tile::Floor);
            if dx != 0 {
                self.set(x, y - 1, Tile::Floor);
                self.set(x, y + 1, Tile::Floor);
            } else {
                self.set(x - 1, y, Tile::Floor);
                self.set(x + 1, y, Tile::Floor);
            }
        }
    }
}

/// Leaf size thresholds derived from the grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LeafLimits {
    min: i32,
    max: i32,
}

impl LeafLimits {
    fn for_grid(config: &GenerationConfig, width: u32, height: u32) -> Self {
        let smaller = width.min(height) as f64;
        let min = (smaller * config.min_leaf_fraction).floor() as i32;
        let max = (smaller * config.max_leaf_fraction).floor() as i32;
        Self {
            min: clamp_low_i32(min, config.min_leaf_clamp.0, config.min_leaf_clamp.1),
            max: clamp_low_i32(max, config.max_leaf_clamp.0, config.max_leaf_clamp.1),
        }
    }
}

/// Primary dungeon generator using binary space partitioning.
///
/// # Examples
///
/// ```
/// use delve::{BspDungeonGenerator, Generator, LevelRequest};
///
/// let generator = BspDungeonGenerator::new();
/// let map = generator.generate(&LevelRequest::new(1, 42, 800.0, 600.0));
/// assert!(map.width() >= 52 && map.height() >= 34);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BspDungeonGenerator {
    /// Tuning for grid size, splitting, rooms and exit placement
    pub config: GenerationConfig,
}

impl BspDungeonGenerator {
    /// Creates a generator with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GenerationConfig::new())
    }

    /// Creates a generator with a custom configuration.
    pub fn with_config(config: GenerationConfig) -> Self {
        Self { config }
    }

    /// Recursively partitions the interior into leaves.
    ///
    /// The loop is bounded by `max_split_attempts`; running out of attempts
    /// simply leaves some oversized leaves behind.
    fn partition(&self, rng: &mut XorShift32, width: u32, height: u32, limits: LeafLimits) -> Vec<Rect> {
        let mut leaves = vec![Rect::new(
            BORDER,
            BORDER,
            width as i32 - BORDER * 2,
            height as i32 - BORDER * 2,
        )];

        for _ in 0..self.config.max_split_attempts {
            let candidates: Vec<usize> = leaves
                .iter()
                .enumerate()
                .filter(|(_, r)| r.w > limits.max || r.h > limits.max)
                .map(|(i, _)| i)
                .collect();
            if candidates.is_empty() {
                break;
            }

            let leaf = leaves.remove(candidates[rng.index(candidates.len())]);
            let split_horizontally = if leaf.w < leaf.h {
                true
            } else if leaf.h < leaf.w {
                false
            } else {
                rng.chance(0.5)
            };

            let (first, second) = if split_horizontally {
                let split = self.split_point(rng, leaf.h, limits.min);
                (
                    Rect::new(leaf.x, leaf.y, leaf.w, split),
                    Rect::new(leaf.x, leaf.y + split, leaf.w, leaf.h - split),
                )
            } else {
                let split = self.split_point(rng, leaf.w, limits.min);
                (
                    Rect::new(leaf.x, leaf.y, split, leaf.h),
                    Rect::new(leaf.x + split, leaf.y, leaf.w - split, leaf.h),
                )
            };
            leaves.push(first);
            leaves.push(second);
        }

        leaves
    }

    fn split_point(&self, rng: &mut XorShift32, extent: i32, min_leaf: i32) -> i32 {
        let fraction = self.config.split_start + rng.next_f64() * self.config.split_span;
        clamp_low(
            extent as f64 * fraction,
            min_leaf as f64,
            (extent - min_leaf) as f64,
        )
        .floor() as i32
    }

    fn room_side(&self, rng: &mut XorShift32, extent: i32) -> i32 {
        let fraction =
            self.config.room_fraction_start + rng.next_f64() * self.config.room_fraction_span;
        clamp_low(
            extent as f64 * fraction,
            self.config.min_room_side as f64,
            (extent - 2) as f64,
        )
        .floor() as i32
    }

    /// Carves a room, plus up to two pillars, into each leaf at least `min` on both sides.
    fn carve_rooms(
        &self,
        canvas: &mut Canvas,
        rng: &mut XorShift32,
        leaves: &[Rect],
        limits: LeafLimits,
    ) -> Vec<Rect> {
        let mut rooms = Vec::new();
        let cfg = &self.config;

        for leaf in leaves {
            if leaf.w < limits.min || leaf.h < limits.min {
                continue;
            }

            let room_w = self.room_side(rng, leaf.w);
            let room_h = self.room_side(rng, leaf.h);
            let room_x = leaf.x + 1 + rng.index((leaf.w - room_w - 1).max(1) as usize) as i32;
            let room_y = leaf.y + 1 + rng.index((leaf.h - room_h - 1).max(1) as usize) as i32;
            let room = Rect::new(room_x, room_y, room_w, room_h);
            canvas.carve_rect(&room);

            let pillars = rng.index(cfg.pillar_choices.max(1) as usize);
            for _ in 0..pillars {
                let px = room.x + 2 + rng.index((room.w - 4).max(1) as usize) as i32;
                let py = room.y + 2 + rng.index((room.h - 4).max(1) as usize) as i32;
                canvas.set(px, py, Tile::Wall);
            }

            rooms.push(room);
        }

        rooms
    }

    /// Joins room centres, ordered by `x + y`, with L-shaped corridors.
    fn connect_rooms(&self, canvas: &mut Canvas, rng: &mut XorShift32, rooms: &[Rect]) {
        let mut centers: Vec<Position> = rooms.iter().map(Rect::center).collect();
        centers.sort_by_key(|c| c.x + c.y);

        for pair in centers.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if rng.chance(0.5) {
                let corner = Position::new(b.x, a.y);
                canvas.carve_corridor(a, corner);
                canvas.carve_corridor(corner, b);
            } else {
                let corner = Position::new(a.x, b.y);
                canvas.carve_corridor(a, corner);
                canvas.carve_corridor(corner, b);
            }
        }
    }

    /// Chooses start and exit room centres.
    ///
    /// The exit is the first of `exit_samples` random centres far enough from
    /// the start; if none qualifies, a centre drawn up front is used instead.
    /// With a single room start and exit coincide.
    fn place_start_and_exit(
        &self,
        rng: &mut XorShift32,
        rooms: &[Rect],
        width: u32,
        height: u32,
    ) -> Option<(Position, Position)> {
        if rooms.is_empty() {
            return None;
        }

        let start = rooms[rng.index(rooms.len())].center();
        let mut exit = rooms[rng.index(rooms.len())].center();
        let threshold = (width + height) as f64 * self.config.exit_distance_fraction;

        for _ in 0..self.config.exit_samples {
            let candidate = rooms[rng.index(rooms.len())].center();
            if candidate.manhattan_distance(start) as f64 > threshold {
                exit = candidate;
                break;
            }
        }

        Some((start, exit))
    }
}

impl Generator for BspDungeonGenerator {
    type Input = LevelRequest;
    type Output = LevelMap;

    fn generate(&self, request: &LevelRequest) -> LevelMap {
        let (width, height) = self
            .config
            .grid_dimensions(request.viewport_width, request.viewport_height);
        let seed = request.level_seed();
        let mut rng = XorShift32::new(seed);
        let mut canvas = Canvas::new(width, height);

        let limits = LeafLimits::for_grid(&self.config, width, height);
        let leaves = self.partition(&mut rng, width, height, limits);
        let rooms = self.carve_rooms(&mut canvas, &mut rng, &leaves, limits);
        self.connect_rooms(&mut canvas, &mut rng, &rooms);

        let (start, exit) = self
            .place_start_and_exit(&mut rng, &rooms, width, height)
            .unwrap_or_else(|| {
                log::warn!(
                    "Floor {} (seed {:#010x}) produced no rooms; using the grid centre",
                    request.floor,
                    seed
                );
                let center = Position::new(width as i32 / 2, height as i32 / 2);
                (center, center)
            });

        let r = self.config.exit_clearing_radius;
        canvas.carve_rect(&Rect::new(exit.x - r, exit.y - r, r * 2 + 1, r * 2 + 1));
        if rooms.is_empty() {
            canvas.set(start.x, start.y, Tile::Floor);
        }

        log::debug!(
            "Generated floor {} seed {:#010x}: {}x{} tiles, {} leaves, {} rooms, start {:?}, exit {:?}",
            request.floor,
            seed,
            width,
            height,
            leaves.len(),
            rooms.len(),
            start,
            exit
        );

        LevelMap::from_generated(
            seed,
            request.floor,
            width,
            height,
            self.config.tile_size,
            canvas.tiles,
            start,
            exit,
        )
    }

    fn validate(&self, level: &LevelMap) -> DelveResult<()> {
        utils::validate_level(&NavGrid::new(level.clone()))
    }

    fn generator_type(&self) -> &'static str {
        "BspDungeonGenerator"
    }
}

/// Generates the level for `floor` of a run seeded with `base_seed`.
///
/// Identical arguments always produce an identical `LevelMap`.
///
/// # Examples
///
/// ```
/// use delve::generate_level;
///
/// let a = generate_level(1, 42, 800.0, 600.0);
/// let b = generate_level(1, 42, 800.0, 600.0);
/// assert_eq!(a, b);
/// ```
pub fn generate_level(floor: u32, base_seed: u32, viewport_width: f64, viewport_height: f64) -> LevelMap {
    BspDungeonGenerator::new().generate(&LevelRequest::new(
        floor,
        base_seed,
        viewport_width,
        viewport_height,
    ))
}
