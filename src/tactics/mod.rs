//! # Tactics Module
//!
//! Per-enemy goal selection and path following.
//!
//! Each tick an enemy's planner pass looks at where the threat is, whether it
//! can see it, and whether it was recently hit, then picks a movement goal:
//! cover when under fire, a flanking point or stand-off/approach/hold position
//! by role otherwise. The goal is turned into a path over the `NavGrid` and the
//! path into a velocity for the physics collaborator.
//!
//! The planner never fails. An empty cover set or an unreachable goal degrades
//! to holding position or moving straight at the goal.

pub mod movement;
pub mod selection;

pub use movement::*;
pub use selection::*;

use crate::navigation::NavGrid;
use crate::{DelveError, DelveResult, WeaponState, WorldPoint};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_3;

/// Behavioural role fixed at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Holds a firing distance from the threat
    Suppress,
    /// Works around the threat's side via cover
    Flank,
}

/// Why the current goal was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalKind {
    /// Retreat to cover after taking fire
    Cover,
    /// Lateral cover point beside the threat
    Flank,
    /// Back away from a close threat
    StandOff,
    /// Move straight at the threat
    Approach,
    /// Stay where the enemy stood when the goal was chosen
    Hold,
}

/// Tuning for the tactical planner. Distances are world units, times milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticalConfig {
    /// How long after taking damage an enemy still counts as threatened
    pub damage_window_ms: u64,
    /// Search radius for cover points when threatened
    pub cover_radius: f64,
    /// Search radius for flank points
    pub flank_radius: f64,
    /// Flank points closer than this to the enemy's bearing from the threat are skipped
    pub flank_exclusion_arc: f64,
    /// The goal is re-chosen once the enemy is this close to it
    pub goal_reached_radius: f64,
    pub goal_replan_ms: u64,
    pub path_replan_ms: u64,
    /// The path cursor advances once within this distance of a waypoint
    pub arrival_radius: f64,
    pub movement_speed: f64,
    /// How far a suppressor steps back from a close threat
    pub stand_off_distance: f64,
    /// Suppressors back off inside this range
    pub close_range: f64,
    /// Suppressors advance beyond this range
    pub far_range: f64,
    /// The threat is only seen within this range
    pub sight_range: f64,
    /// Cover score: `distance_weight * d(enemy, p) - threat_weight * d(p, threat)`
    pub cover_distance_weight: f64,
    pub cover_threat_weight: f64,
    /// Flank score: `distance_weight * d + threat_weight * dt - angle_weight * delta`
    pub flank_distance_weight: f64,
    pub flank_threat_weight: f64,
    pub flank_angle_weight: f64,
}

impl TacticalConfig {
    /// Creates the default tactical configuration.
    pub fn new() -> Self {
        Self {
            damage_window_ms: 850,
            cover_radius: 520.0,
            flank_radius: 600.0,
            flank_exclusion_arc: FRAC_PI_3,
            goal_reached_radius: 20.0,
            goal_replan_ms: 800,
            path_replan_ms: 520,
            arrival_radius: 10.0,
            movement_speed: 175.0,
            stand_off_distance: 200.0,
            close_range: 260.0,
            far_range: 520.0,
            sight_range: 1200.0,
            cover_distance_weight: 0.8,
            cover_threat_weight: 0.15,
            flank_distance_weight: 1.0,
            flank_threat_weight: 0.25,
            flank_angle_weight: 30.0,
        }
    }

    /// Rejects configurations with non-positive timers or radii.
    pub fn validate(&self) -> DelveResult<()> {
        if self.goal_replan_ms == 0 || self.path_replan_ms == 0 {
            return Err(DelveError::InvalidConfig(
                "re-plan intervals must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("cover_radius", self.cover_radius),
            ("flank_radius", self.flank_radius),
            ("goal_reached_radius", self.goal_reached_radius),
            ("arrival_radius", self.arrival_radius),
            ("movement_speed", self.movement_speed),
            ("sight_range", self.sight_range),
        ] {
            if !(value > 0.0) {
                return Err(DelveError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.close_range > self.far_range {
            return Err(DelveError::InvalidConfig(format!(
                "close_range {} exceeds far_range {}",
                self.close_range, self.far_range
            )));
        }
        Ok(())
    }
}

impl Default for TacticalConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable tactical memory of one enemy. Owned by the enemy; the planner
/// mutates nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalState {
    pub role: Role,
    /// Current movement goal, if one has been chosen
    pub goal: Option<WorldPoint>,
    pub goal_kind: Option<GoalKind>,
    /// Waypoints towards the goal
    pub path: Vec<WorldPoint>,
    /// Index of the next waypoint in `path`
    pub path_index: usize,
    /// Simulation time of the last hit taken
    pub last_damage_at: Option<u64>,
    pub next_goal_replan_at: u64,
    pub next_path_replan_at: u64,
}

impl TacticalState {
    /// Fresh state with no goal, no path and no recorded damage.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            goal: None,
            goal_kind: None,
            path: Vec::new(),
            path_index: 0,
            last_damage_at: None,
            next_goal_replan_at: 0,
            next_path_replan_at: 0,
        }
    }

    /// Records a hit at `now`.
    pub fn record_damage(&mut self, now: u64) {
        self.last_damage_at = Some(now);
    }

    /// Whether the last hit landed within `window_ms` of `now`.
    pub fn recently_damaged(&self, now: u64, window_ms: u64) -> bool {
        self.last_damage_at
            .map_or(false, |at| now.saturating_sub(at) < window_ms)
    }

    /// Whether the cursor has run past the last waypoint.
    pub fn path_exhausted(&self) -> bool {
        self.path_index >= self.path.len()
    }

    fn set_goal(&mut self, goal: WorldPoint, kind: GoalKind) {
        self.goal = Some(goal);
        self.goal_kind = Some(kind);
    }
}

/// What the planner decided for one enemy on one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TacticalDecision {
    pub goal: WorldPoint,
    pub goal_kind: GoalKind,
    /// Desired velocity in world units per second
    pub velocity: WorldPoint,
    /// Line of sight to the threat within sight range
    pub sees_threat: bool,
    pub threat_distance: f64,
}

/// Stateless planner over one level. Cheap to build per tick.
///
/// # Examples
///
/// ```
/// use delve::{generate_level, NavGrid, Role, TacticalConfig, TacticalPlanner, TacticalState};
///
/// let nav = NavGrid::new(generate_level(1, 42, 800.0, 600.0));
/// let config = TacticalConfig::new();
/// let planner = TacticalPlanner::new(&nav, &config);
///
/// let mut state = TacticalState::new(Role::Suppress);
/// let enemy = nav.to_world_center(nav.map().exit());
/// let threat = nav.to_world_center(nav.map().start());
/// let decision = planner.update(&mut state, enemy, threat, 0);
/// assert!(decision.velocity.length() <= config.movement_speed + 1e-9);
/// assert!(state.goal.is_some());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TacticalPlanner<'a> {
    nav: &'a NavGrid,
    config: &'a TacticalConfig,
}

impl<'a> TacticalPlanner<'a> {
    pub fn new(nav: &'a NavGrid, config: &'a TacticalConfig) -> Self {
        Self { nav, config }
    }

    pub fn nav(&self) -> &'a NavGrid {
        self.nav
    }

    pub fn config(&self) -> &'a TacticalConfig {
        self.config
    }

    /// Whether an enemy at `enemy` can see `threat`: within sight range and
    /// an unobstructed tile line.
    pub fn sees(&self, enemy: WorldPoint, threat: WorldPoint) -> bool {
        enemy.distance(threat) <= self.config.sight_range
            && self.nav.has_line_of_sight_world(enemy, threat)
    }

    /// Runs one planning pass for one enemy.
    ///
    /// Goal selection happens first, then path following towards whatever
    /// goal is current. A cover goal taken under fire this tick is kept even
    /// if the regular re-plan is also due.
    pub fn update(
        &self,
        state: &mut TacticalState,
        enemy: WorldPoint,
        threat: WorldPoint,
        now: u64,
    ) -> TacticalDecision {
        let cfg = self.config;
        let threat_distance = enemy.distance(threat);
        let sees_threat = self.sees(enemy, threat);
        let previous_goal = state.goal;

        let mut took_cover = false;
        if sees_threat && state.recently_damaged(now, cfg.damage_window_ms) {
            if let Some(cover) = self.pick_cover_point(enemy, threat) {
                state.set_goal(cover, GoalKind::Cover);
                took_cover = true;
            }
        }

        let goal_due = match state.goal {
            None => true,
            Some(goal) => {
                enemy.distance(goal) < cfg.goal_reached_radius || now >= state.next_goal_replan_at
            }
        };
        if goal_due && !took_cover {
            let (goal, kind) = self.role_goal(state.role, enemy, threat, sees_threat, threat_distance);
            state.set_goal(goal, kind);
        }
        if goal_due || took_cover {
            state.next_goal_replan_at = now + cfg.goal_replan_ms;
        }

        let goal = state.goal.unwrap_or(enemy);
        let goal_kind = state.goal_kind.unwrap_or(GoalKind::Hold);
        let goal_changed = previous_goal != Some(goal);
        if goal_changed {
            log::trace!(
                "{:?} enemy at ({:.0}, {:.0}) picked {:?} goal ({:.0}, {:.0})",
                state.role,
                enemy.x,
                enemy.y,
                goal_kind,
                goal.x,
                goal.y
            );
        }

        let velocity = self.follow_path(state, enemy, goal, now, goal_changed);

        TacticalDecision {
            goal,
            goal_kind,
            velocity,
            sees_threat,
            threat_distance,
        }
    }

    /// The goal a role wants when no cover retreat is under way.
    pub fn role_goal(
        &self,
        role: Role,
        enemy: WorldPoint,
        threat: WorldPoint,
        sees_threat: bool,
        threat_distance: f64,
    ) -> (WorldPoint, GoalKind) {
        let cfg = self.config;
        match role {
            Role::Flank => match self.pick_flank_point(enemy, threat) {
                Some(point) => (point, GoalKind::Flank),
                None => (threat, GoalKind::Approach),
            },
            Role::Suppress if sees_threat && threat_distance < cfg.close_range => {
                let away = (enemy - threat).normalized();
                (enemy + away.scale(cfg.stand_off_distance), GoalKind::StandOff)
            }
            Role::Suppress if sees_threat && threat_distance > cfg.far_range => {
                (threat, GoalKind::Approach)
            }
            Role::Suppress => (enemy, GoalKind::Hold),
        }
    }
}

/// Engagement gate: line of sight, target within weapon range, weapon ready.
///
/// Evaluated independently of movement so that goal selection never blocks firing.
pub fn should_engage(decision: &TacticalDecision, weapon: &WeaponState, now: u64) -> bool {
    decision.sees_threat
        && decision.threat_distance <= weapon.def().range
        && weapon.can_shoot(now)
}
