//! # Pathfinding
//!
//! A* over 4-connected walkable tiles with unit step cost and a Manhattan
//! heuristic.
//!
//! Among open tiles sharing the lowest f-score, the one that entered the open
//! set first is expanded first. Each open tile keeps the sequence number it was
//! given on entry; lowering its f-score pushes a fresh heap entry under the same
//! number, and stale entries are skipped on pop. Paths are therefore a pure
//! function of the map and the endpoints.

use super::NavGrid;
use crate::{Position, WorldPoint};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Open-set entry for the A* search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AStarNode {
    f_score: u32,
    /// Order in which the tile entered the open set
    seq: u64,
    index: usize,
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior in BinaryHeap
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Per-tile search bookkeeping, indexed by flat tile index.
#[derive(Debug, Clone, Copy)]
struct NodeRecord {
    g_score: u32,
    f_score: u32,
    came_from: Option<usize>,
    /// `Some(seq)` while the tile sits in the open set
    open_seq: Option<u64>,
}

impl Default for NodeRecord {
    fn default() -> Self {
        Self {
            g_score: u32::MAX,
            f_score: u32::MAX,
            came_from: None,
            open_seq: None,
        }
    }
}

impl NavGrid {
    /// Shortest 4-connected path between two tiles.
    ///
    /// The result excludes `source` and ends at `goal`. It is empty when
    /// either endpoint is not walkable or no path exists. When the two are
    /// the same walkable tile the path is just `[goal]`.
    pub fn find_path(&self, source: Position, goal: Position) -> Vec<Position> {
        if !self.is_walkable(source) || !self.is_walkable(goal) {
            return Vec::new();
        }
        if source == goal {
            return vec![goal];
        }

        let map = self.map();
        let (Some(start_index), Some(goal_index)) = (map.index_of(source), map.index_of(goal))
        else {
            return Vec::new();
        };
        let width = map.width() as usize;
        let position_of = |index: usize| Position::new((index % width) as i32, (index / width) as i32);

        let mut records = vec![NodeRecord::default(); map.tiles().len()];
        let mut open_set = BinaryHeap::new();
        let mut next_seq = 0u64;

        let h = source.manhattan_distance(goal);
        records[start_index] = NodeRecord {
            g_score: 0,
            f_score: h,
            came_from: None,
            open_seq: Some(next_seq),
        };
        open_set.push(AStarNode {
            f_score: h,
            seq: next_seq,
            index: start_index,
        });
        next_seq += 1;

        while let Some(node) = open_set.pop() {
            let record = records[node.index];
            if record.open_seq != Some(node.seq) || record.f_score != node.f_score {
                continue;
            }
            records[node.index].open_seq = None;

            if node.index == goal_index {
                let mut path = Vec::new();
                let mut current = goal_index;
                while let Some(prev) = records[current].came_from {
                    path.push(position_of(current));
                    current = prev;
                }
                path.reverse();
                return path;
            }

            let current = position_of(node.index);
            let tentative = record.g_score + 1;
            for neighbor in self.neighbors4(current) {
                let Some(ni) = map.index_of(neighbor) else {
                    continue;
                };
                if tentative >= records[ni].g_score {
                    continue;
                }

                let f = tentative + neighbor.manhattan_distance(goal);
                let seq = match records[ni].open_seq {
                    Some(seq) => seq,
                    None => {
                        let seq = next_seq;
                        next_seq += 1;
                        seq
                    }
                };
                records[ni] = NodeRecord {
                    g_score: tentative,
                    f_score: f,
                    came_from: Some(node.index),
                    open_seq: Some(seq),
                };
                open_set.push(AStarNode {
                    f_score: f,
                    seq,
                    index: ni,
                });
            }
        }

        Vec::new()
    }

    /// Path between two world points as tile-centre waypoints.
    pub fn find_path_world(&self, from: WorldPoint, to: WorldPoint) -> Vec<WorldPoint> {
        self.find_path(self.to_tile(from), self.to_tile(to))
            .into_iter()
            .map(|p| self.to_world_center(p))
            .collect()
    }
}
