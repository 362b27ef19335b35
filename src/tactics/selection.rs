//! # Goal Selection
//!
//! Scoring of cover points as retreat and flanking destinations.
//!
//! Both searches scan the level's cached cover points in row-major order and
//! keep the first point with the strictly lowest score, so equal scores
//! resolve to the earlier point.

use super::TacticalPlanner;
use crate::utils::angle_delta;
use crate::WorldPoint;

impl TacticalPlanner<'_> {
    /// Best cover point to retreat to from `enemy` while under fire from `threat`.
    ///
    /// Candidates lie within the cover radius of the enemy and have no line of
    /// sight to the threat. The score `0.8 * d(enemy, p) - 0.15 * d(p, threat)`
    /// is minimised: nearby cover that is still some way from the threat.
    pub fn pick_cover_point(&self, enemy: WorldPoint, threat: WorldPoint) -> Option<WorldPoint> {
        let cfg = self.config();
        let nav = self.nav();
        let mut best: Option<(WorldPoint, f64)> = None;

        for &point in nav.cover_points() {
            let d = enemy.distance(point);
            if d > cfg.cover_radius {
                continue;
            }
            if nav.has_line_of_sight_world(point, threat) {
                continue;
            }
            let score = cfg.cover_distance_weight * d - cfg.cover_threat_weight * point.distance(threat);
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((point, score));
            }
        }
        best.map(|(point, _)| point)
    }

    /// Best flanking cover point around `threat` for an enemy at `enemy`.
    ///
    /// Candidates lie within the flank radius, have no line of sight to the
    /// threat, and sit at least the exclusion arc away from the enemy's current
    /// bearing as seen from the threat. The score
    /// `d + 0.25 * d(p, threat) - 30 * delta` is minimised, so a wide swing
    /// around the threat can outweigh a longer walk.
    pub fn pick_flank_point(&self, enemy: WorldPoint, threat: WorldPoint) -> Option<WorldPoint> {
        let cfg = self.config();
        let nav = self.nav();
        let enemy_bearing = threat.bearing_to(enemy);
        let mut best: Option<(WorldPoint, f64)> = None;

        for &point in nav.cover_points() {
            let d = enemy.distance(point);
            if d > cfg.flank_radius {
                continue;
            }
            if nav.has_line_of_sight_world(point, threat) {
                continue;
            }
            let delta = angle_delta(threat.bearing_to(point), enemy_bearing);
            if delta < cfg.flank_exclusion_arc {
                continue;
            }
            let score = cfg.flank_distance_weight * d + cfg.flank_threat_weight * point.distance(threat)
                - cfg.flank_angle_weight * delta;
            if best.map_or(true, |(_, s)| score < s) {
                best = Some((point, score));
            }
        }
        best.map(|(point, _)| point)
    }
}
