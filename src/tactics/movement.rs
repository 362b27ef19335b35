//! # Path Following
//!
//! Turns the current goal into a velocity by walking a cached A* path.

use super::{TacticalPlanner, TacticalState};
use crate::WorldPoint;

impl TacticalPlanner<'_> {
    /// Whether the enemy's path must be rebuilt this tick.
    pub fn needs_path(&self, state: &TacticalState, now: u64) -> bool {
        state.path.is_empty() || state.path_exhausted() || now >= state.next_path_replan_at
    }

    /// Advances along the path to `goal` and returns the desired velocity.
    ///
    /// The path is rebuilt when it is empty, exhausted, due for its periodic
    /// refresh, or `force_replan` is set. When no path exists the enemy heads
    /// straight for the goal. Reaching the final waypoint yields zero velocity.
    pub fn follow_path(
        &self,
        state: &mut TacticalState,
        enemy: WorldPoint,
        goal: WorldPoint,
        now: u64,
        force_replan: bool,
    ) -> WorldPoint {
        let cfg = self.config();
        if force_replan || self.needs_path(state, now) {
            state.path = self.nav().find_path_world(enemy, goal);
            state.path_index = 0;
            state.next_path_replan_at = now + cfg.path_replan_ms;
        }

        let target = state.path.get(state.path_index).copied().unwrap_or(goal);
        let offset = target - enemy;
        let distance = offset.length();

        if distance < cfg.arrival_radius {
            state.path_index += 1;
            if state.path_exhausted() {
                return WorldPoint::zero();
            }
        }

        offset.scale(cfg.movement_speed / distance.max(0.001))
    }
}
