//! # World Representation
//!
//! The tile grid produced by generation and read by everything else.
//!
//! A `LevelMap` is immutable once built: generation assembles a flat tile
//! buffer and hands it over in one piece, and every later consumer only reads.

use crate::{DelveError, DelveResult, Position};
use serde::{Deserialize, Serialize};

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Wall,
    Floor,
}

impl Tile {
    /// Whether actors can stand on this tile.
    pub fn is_floor(self) -> bool {
        self == Tile::Floor
    }

    /// ASCII glyph used by [`LevelMap::to_ascii`].
    pub fn glyph(self) -> char {
        match self {
            Tile::Wall => '#',
            Tile::Floor => '.',
        }
    }
}

/// A generated level: a row-major wall/floor grid with start and exit cells.
///
/// # Examples
///
/// ```
/// use delve::{LevelMap, Position, Tile};
///
/// let mut tiles = vec![Tile::Wall; 5 * 4];
/// for x in 1..4 {
///     tiles[2 * 5 + x] = Tile::Floor;
/// }
/// let map = LevelMap::from_tiles(
///     0, 1, 5, 4, 32, tiles, Position::new(1, 2), Position::new(3, 2),
/// ).unwrap();
/// assert_eq!(map.tile(Position::new(2, 2)), Some(Tile::Floor));
/// assert_eq!(map.tile(Position::new(9, 9)), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LevelMapData")]
pub struct LevelMap {
    seed: u32,
    floor: u32,
    width: u32,
    height: u32,
    tile_size: u32,
    tiles: Vec<Tile>,
    start: Position,
    exit: Position,
}

/// Unchecked mirror of [`LevelMap`] that deserialization goes through.
#[derive(Deserialize)]
struct LevelMapData {
    seed: u32,
    floor: u32,
    width: u32,
    height: u32,
    tile_size: u32,
    tiles: Vec<Tile>,
    start: Position,
    exit: Position,
}

impl TryFrom<LevelMapData> for LevelMap {
    type Error = DelveError;

    fn try_from(data: LevelMapData) -> DelveResult<Self> {
        LevelMap::from_tiles(
            data.seed,
            data.floor,
            data.width,
            data.height,
            data.tile_size,
            data.tiles,
            data.start,
            data.exit,
        )
    }
}

impl LevelMap {
    /// Assembles a map from an already-filled buffer.
    ///
    /// The generator calls this with buffers it sized itself. Callers building
    /// maps by hand get a validation error for a buffer of the wrong length, a
    /// zero tile size, or start/exit cells outside the grid.
    #[allow(clippy::too_many_arguments)]
    pub fn from_tiles(
        seed: u32,
        floor: u32,
        width: u32,
        height: u32,
        tile_size: u32,
        tiles: Vec<Tile>,
        start: Position,
        exit: Position,
    ) -> DelveResult<Self> {
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(DelveError::InvalidMap(format!(
                "tile buffer has {} cells, expected {}x{} = {}",
                tiles.len(),
                width,
                height,
                expected
            )));
        }
        if tile_size == 0 {
            return Err(DelveError::InvalidMap("tile size must be positive".to_string()));
        }

        let map = Self {
            seed,
            floor,
            width,
            height,
            tile_size,
            tiles,
            start,
            exit,
        };
        for (label, pos) in [("start", start), ("exit", exit)] {
            if !map.in_bounds(pos) {
                return Err(DelveError::InvalidMap(format!(
                    "{} {:?} lies outside the {}x{} grid",
                    label, pos, width, height
                )));
            }
        }
        Ok(map)
    }

    /// Wraps a buffer the generator sized itself.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_generated(
        seed: u32,
        floor: u32,
        width: u32,
        height: u32,
        tile_size: u32,
        tiles: Vec<Tile>,
        start: Position,
        exit: Position,
    ) -> Self {
        debug_assert_eq!(tiles.len(), width as usize * height as usize);
        Self {
            seed,
            floor,
            width,
            height,
            tile_size,
            tiles,
            start,
            exit,
        }
    }

    /// The generation seed after mixing in the floor index.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The floor index this level was generated for.
    pub fn floor(&self) -> u32 {
        self.floor
    }

    /// Width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// World units per tile.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// The flat row-major tile buffer.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Player start cell.
    pub fn start(&self) -> Position {
        self.start
    }

    /// Exit cell.
    pub fn exit(&self) -> Position {
        self.exit
    }

    /// Whether a tile coordinate lies on the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Flat buffer index for an in-bounds position.
    pub fn index_of(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// The tile at `pos`, or `None` off the grid.
    pub fn tile(&self, pos: Position) -> Option<Tile> {
        self.index_of(pos).and_then(|i| self.tiles.get(i).copied())
    }

    /// Number of floor tiles.
    pub fn floor_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_floor()).count()
    }

    /// Renders the grid as text, one row per line.
    ///
    /// `S` marks the start and `E` the exit; `marks` overlays extra glyphs
    /// (for example cover points) on top of the tiles but below start/exit.
    pub fn to_ascii(&self, marks: &[(Position, char)]) -> String {
        let mut rows: Vec<Vec<char>> = (0..self.height as i32)
            .map(|y| {
                (0..self.width as i32)
                    .map(|x| self.tile(Position::new(x, y)).map_or('#', Tile::glyph))
                    .collect()
            })
            .collect();

        let mut put = |pos: Position, glyph: char| {
            if self.in_bounds(pos) {
                rows[pos.y as usize][pos.x as usize] = glyph;
            }
        };
        for &(pos, glyph) in marks {
            put(pos, glyph);
        }
        put(self.start, 'S');
        put(self.exit, 'E');

        rows.into_iter()
            .map(|row| row.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
