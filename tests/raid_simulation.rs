//! Headless raid runs: ticking enemies over time, clearing floors and
//! carrying the stash across sessions on disk.

use delve::*;
use tempfile::TempDir;

const DT_MS: u64 = 16;

fn settings(seed: u32) -> RaidSettings {
    RaidSettings::new(seed, 1024.0, 768.0)
}

/// Applies each command's velocity, refusing moves into walls.
fn apply_movement(raid: &mut RaidState, commands: &[EnemyCommand]) {
    let dt = DT_MS as f64 / 1000.0;
    for command in commands {
        let Some(enemy) = raid.enemy(command.enemy_id) else {
            continue;
        };
        let next = enemy.position + command.velocity.scale(dt);
        if raid.nav().is_walkable(raid.nav().to_tile(next)) {
            raid.set_enemy_position(command.enemy_id, next);
        }
    }
}

fn run_ticks(raid: &mut RaidState, ticks: u64) -> Vec<Vec<EnemyCommand>> {
    let player = raid.player_spawn();
    let mut history = Vec::new();
    for step in 1..=ticks {
        let commands = raid.tick(step * DT_MS, player);
        apply_movement(raid, &commands);
        history.push(commands);
    }
    history
}

fn clear_floor(raid: &mut RaidState, now: u64) {
    let ids: Vec<u32> = raid.enemies().iter().map(|e| e.id).collect();
    for id in ids {
        raid.damage_enemy(id, u32::MAX, now);
    }
    while let Some(loot) = raid.pickups().iter().find(|p| p.is_loot()).cloned() {
        raid.pick_up_nearest(loot.position);
    }
}

fn extract<S: StashStore, L: LevelTransitionListener>(session: &mut RaidSession<S, L>, now: u64) {
    let exit = session.state().exit_point();
    loop {
        match session.update_exit(DT_MS as f64, exit, now).expect("stash saves") {
            ExitStatus::Advance => break,
            ExitStatus::Holding { .. } => {}
            other => panic!("exit should be holding, got {:?}", other),
        }
    }
}

#[test]
fn test_ticks_are_deterministic() {
    let mut a = RaidState::new(2, &settings(11), 0);
    let mut b = RaidState::new(2, &settings(11), 0);
    assert_eq!(run_ticks(&mut a, 200), run_ticks(&mut b, 200));
    assert_eq!(a.enemies(), b.enemies());
    assert_eq!(a.statistics(), b.statistics());
}

#[test]
fn test_enemies_stay_on_floor_and_within_speed() {
    let mut raid = RaidState::new(1, &settings(42), 0);
    let history = run_ticks(&mut raid, 400);

    for commands in &history {
        for command in commands {
            assert!(command.velocity.length() <= 175.0 + 1e-6);
        }
    }
    for enemy in raid.enemies() {
        assert!(raid.nav().is_walkable(raid.nav().to_tile(enemy.position)));
    }
}

#[test]
fn test_enemy_shots_respect_weapon_timing() {
    let mut raid = RaidState::new(3, &settings(5), 0);
    let history = run_ticks(&mut raid, 600);

    let mut last_shot: std::collections::HashMap<u32, u64> = Default::default();
    for (step, commands) in history.iter().enumerate() {
        let now = (step as u64 + 1) * DT_MS;
        for command in commands {
            let Some(shot) = command.shot else {
                continue;
            };
            assert_eq!(shot.owner, ShotOwner::Enemy(command.enemy_id));
            assert!(shot.speed > 0.0);
            if let Some(previous) = last_shot.insert(command.enemy_id, now) {
                let weapon = raid.enemy(command.enemy_id).map(|e| e.weapon.def().fire_delay_ms);
                if let Some(delay) = weapon {
                    assert!(now - previous >= delay);
                }
            }
        }
    }
    let fired: u32 = history
        .iter()
        .flatten()
        .filter(|c| c.shot.is_some())
        .count() as u32;
    assert_eq!(fired, raid.statistics().enemy_shots);
}

#[test]
fn test_multi_floor_run_banks_loot() {
    let mut session =
        RaidSession::new(settings(42), MemoryStash::new(), NoopTransitions, 1, 0).expect("session");

    let mut banked = 0;
    for floor in 1..=3u32 {
        assert_eq!(session.state().floor(), floor);
        let now = floor as u64 * 10_000;
        clear_floor(session.state_mut(), now);
        banked += session.state().player().inventory.len();
        extract(&mut session, now);
        assert_eq!(session.stash().len(), banked);
    }

    assert_eq!(session.floors_cleared(), 3);
    assert_eq!(session.store().saves, 3);
    assert!(session.statistics().items_collected as usize >= banked);
    assert!(session.statistics().enemies_defeated >= 7 + 8 + 9);
}

#[test]
fn test_stash_survives_between_sessions() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("stash.json");

    let mut first =
        RaidSession::new(settings(9), JsonFileStash::new(&path), NoopTransitions, 1, 0).expect("session");
    clear_floor(first.state_mut(), 0);
    let carried = first.state().player().inventory.clone();
    extract(&mut first, 0);
    assert!(path.exists());

    let second =
        RaidSession::new(settings(9), JsonFileStash::new(&path), NoopTransitions, 1, 0).expect("session");
    assert_eq!(second.stash(), carried.as_slice());
}

#[test]
fn test_death_discards_carried_loot() {
    let mut session =
        RaidSession::new(settings(3), MemoryStash::new(), NoopTransitions, 2, 0).expect("session");
    let loot = session
        .state()
        .pickups()
        .iter()
        .find(|p| p.is_loot())
        .cloned()
        .expect("floor has loot");
    session.state_mut().pick_up_nearest(loot.position);

    assert_eq!(session.damage_player(config::PLAYER_MAX_HP, 0), DamageOutcome::Killed);
    assert_eq!(session.state().floor(), 1);
    assert!(session.stash().is_empty());
    assert_eq!(session.store().saves, 0);
}
