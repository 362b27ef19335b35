//! Tactical planner scenarios on hand-built rooms.

use delve::*;

fn map_from_rows(rows: &[String]) -> LevelMap {
    let height = rows.len() as u32;
    let width = rows[0].len() as u32;
    let tiles = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|c| if c == '#' { Tile::Wall } else { Tile::Floor })
        .collect();
    LevelMap::from_tiles(0, 1, width, height, 32, tiles, Position::new(1, 1), Position::new(1, 1))
        .expect("rows describe a valid map")
}

/// A 30x15 room. With `pillar` set, a 3x5 block at x 16..=18, y 5..=9
/// shadows the east side from a threat on row 7.
fn room(pillar: bool) -> NavGrid {
    let rows: Vec<String> = (0..15)
        .map(|y| {
            (0..30)
                .map(|x| {
                    let border = x == 0 || y == 0 || x == 29 || y == 14;
                    let block = pillar && (16..=18).contains(&x) && (5..=9).contains(&y);
                    if border || block {
                        '#'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect();
    NavGrid::new(map_from_rows(&rows))
}

#[test]
fn test_damaged_flanker_takes_cover() {
    let nav = room(true);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(3, 7));
    let enemy = nav.to_world_center(Position::new(12, 7));

    let mut state = TacticalState::new(Role::Flank);
    state.record_damage(1000);
    let decision = planner.update(&mut state, enemy, threat, 1100);

    assert!(decision.sees_threat);
    assert!((decision.threat_distance - 288.0).abs() < 1e-9);
    assert_eq!(decision.goal_kind, GoalKind::Cover);
    assert!(decision.goal.distance(enemy) <= config.cover_radius);
    assert!(!nav.has_line_of_sight_world(decision.goal, threat));
    assert!(nav.cover_points().contains(&decision.goal));
    assert_eq!(state.next_goal_replan_at, 1100 + config.goal_replan_ms);

    // Retreating never blocks firing.
    let pistol = WeaponState::new(WeaponId::Pistol, 36);
    assert!(should_engage(&decision, &pistol, 1100));
}

#[test]
fn test_cover_goal_moves_enemy_along_path() {
    let nav = room(true);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(3, 7));
    let enemy = nav.to_world_center(Position::new(12, 7));

    let mut state = TacticalState::new(Role::Flank);
    state.record_damage(1000);
    let decision = planner.update(&mut state, enemy, threat, 1100);

    assert!(!state.path.is_empty());
    assert_eq!(state.path.last(), Some(&decision.goal));
    assert!((decision.velocity.length() - config.movement_speed).abs() < 1e-6);
}

#[test]
fn test_undamaged_flanker_without_wide_angle_cover_approaches() {
    // The only hidden tiles sit in the pillar's narrow shadow, straight
    // behind the enemy's own bearing, so no flank point qualifies.
    let nav = room(true);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(3, 7));
    let enemy = nav.to_world_center(Position::new(12, 7));

    let mut state = TacticalState::new(Role::Flank);
    let decision = planner.update(&mut state, enemy, threat, 0);
    assert_eq!(decision.goal_kind, GoalKind::Approach);
    assert_eq!(decision.goal, threat);
}

#[test]
fn test_damage_outside_window_is_ignored() {
    let nav = room(true);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(3, 7));
    let enemy = nav.to_world_center(Position::new(12, 7));

    let mut state = TacticalState::new(Role::Flank);
    state.record_damage(1000);
    let decision = planner.update(&mut state, enemy, threat, 1000 + config.damage_window_ms);
    assert_ne!(decision.goal_kind, GoalKind::Cover);
}

#[test]
fn test_hidden_enemy_does_not_take_cover() {
    let nav = room(true);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(3, 7));
    let enemy = nav.to_world_center(Position::new(22, 7));

    let mut state = TacticalState::new(Role::Flank);
    state.record_damage(1000);
    let decision = planner.update(&mut state, enemy, threat, 1100);
    assert!(!decision.sees_threat);
    assert_ne!(decision.goal_kind, GoalKind::Cover);
}

#[test]
fn test_damaged_enemy_in_open_room_keeps_role_goal() {
    let nav = room(false);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(5, 7));
    let enemy = nav.to_world_center(Position::new(14, 7));

    assert_eq!(planner.pick_cover_point(enemy, threat), None);

    let mut state = TacticalState::new(Role::Flank);
    state.record_damage(500);
    let decision = planner.update(&mut state, enemy, threat, 600);
    assert_eq!(decision.goal_kind, GoalKind::Approach);
}

#[test]
fn test_suppressor_backs_off_when_close() {
    let nav = room(false);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(10, 7));
    let enemy = nav.to_world_center(Position::new(13, 7));

    let mut state = TacticalState::new(Role::Suppress);
    let decision = planner.update(&mut state, enemy, threat, 0);
    assert_eq!(decision.goal_kind, GoalKind::StandOff);
    assert!((decision.goal.x - (enemy.x + config.stand_off_distance)).abs() < 1e-9);
    assert!(decision.velocity.x > 0.0);
}

#[test]
fn test_suppressor_holds_at_mid_range() {
    let nav = room(false);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(3, 7));
    let enemy = nav.to_world_center(Position::new(15, 7));

    let mut state = TacticalState::new(Role::Suppress);
    let decision = planner.update(&mut state, enemy, threat, 0);
    assert_eq!(decision.goal_kind, GoalKind::Hold);
    assert_eq!(decision.velocity, WorldPoint::zero());
}

#[test]
fn test_goal_is_kept_until_replan_is_due() {
    let nav = room(false);
    let config = TacticalConfig::new();
    let planner = TacticalPlanner::new(&nav, &config);
    let threat = nav.to_world_center(Position::new(10, 7));
    let enemy = nav.to_world_center(Position::new(13, 7));

    let mut state = TacticalState::new(Role::Suppress);
    let first = planner.update(&mut state, enemy, threat, 0);

    // The threat walks off; the stand-off goal survives until the timer fires.
    let moved = nav.to_world_center(Position::new(3, 7));
    let second = planner.update(&mut state, enemy, moved, 400);
    assert_eq!(second.goal, first.goal);
    assert_eq!(second.goal_kind, GoalKind::StandOff);

    let third = planner.update(&mut state, enemy, moved, config.goal_replan_ms);
    assert_eq!(third.goal_kind, GoalKind::Hold);
}
