//! # Delve Command Line Entry Point
//!
//! Generates floors for inspection and runs headless raids, acting as the
//! physics collaborator: it integrates enemy steering against the tile grid,
//! moves bullets, and reports hits back to the raid.

use clap::{Args as ClapArgs, Parser, Subcommand};
use delve::{
    BspDungeonGenerator, DamageOutcome, DelveConfig, DelveError, DelveResult, EncounterGenerator,
    ExitStatus, Generator, ItemGenerator, JsonFileStash, LevelRequest, LevelTransitionListener,
    MemoryStash, NavGrid, PickupKind, Position, RaidSession, RaidSettings, ShotOwner, ShotRequest,
    StashStore, WorldPoint,
};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Command line arguments for Delve.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Procedural raid floors and enemy tactics for a top-down extraction shooter")]
#[command(version)]
struct Args {
    /// JSON configuration file; missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one floor and print it
    Generate(GenerateArgs),
    /// Run a headless raid with the player parked on the start tile
    Simulate(SimulateArgs),
}

#[derive(ClapArgs, Debug)]
struct LevelArgs {
    /// Floor index (1-based)
    #[arg(short, long, default_value_t = 1)]
    floor: u32,

    /// Base seed for the run
    #[arg(short, long, default_value_t = 0)]
    seed: u32,

    /// Viewport width in world units
    #[arg(long, default_value_t = 1280.0)]
    viewport_width: f64,

    /// Viewport height in world units
    #[arg(long, default_value_t = 720.0)]
    viewport_height: f64,
}

#[derive(ClapArgs, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    level: LevelArgs,

    /// Print the level as JSON instead of ASCII
    #[arg(long)]
    json: bool,

    /// Mark cover tiles with `c`
    #[arg(long)]
    show_cover: bool,

    /// Mark enemy spawns with `e`, loot with `l` and ammo with `a`
    #[arg(long)]
    show_spawns: bool,
}

#[derive(ClapArgs, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    level: LevelArgs,

    /// Number of simulation ticks
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Tick length in milliseconds
    #[arg(long, default_value_t = 16)]
    dt: u64,

    /// Stash file; an in-memory stash is used when omitted
    #[arg(long)]
    stash: Option<PathBuf>,
}

/// Distance within which a bullet hits its target, in world units.
const HIT_RADIUS: f64 = 14.0;

/// Longest bullet step before collision checks, in world units.
const BULLET_SUBSTEP: f64 = 8.0;

fn main() -> DelveResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level);
    info!("Starting Delve v{}", delve::VERSION);

    let config = match &args.config {
        Some(path) => DelveConfig::from_json_file(path)?,
        None => DelveConfig::default(),
    };

    match args.command {
        Command::Generate(generate) => run_generate(&config, &generate),
        Command::Simulate(simulate) => run_simulate(config, &simulate),
    }
}

/// Initializes env_logger; `RUST_LOG` overrides `--log-level`.
fn initialize_logging(log_level: &str) {
    let env = env_logger::Env::default().default_filter_or(log_level.to_lowercase());
    env_logger::Builder::from_env(env)
        .format_target(false)
        .init();
}

fn run_generate(config: &DelveConfig, args: &GenerateArgs) -> DelveResult<()> {
    let request = LevelRequest::new(
        args.level.floor,
        args.level.seed,
        args.level.viewport_width,
        args.level.viewport_height,
    );
    let generator = BspDungeonGenerator::with_config(config.generation.clone());
    let map = generator.generate(&request);
    if let Err(e) = generator.validate(&map) {
        warn!("Generated level failed validation: {}", e);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    let nav = NavGrid::new(map);
    let mut marks: Vec<(Position, char)> = Vec::new();
    if args.show_cover {
        marks.extend(nav.compute_cover_tiles().into_iter().map(|p| (p, 'c')));
    }
    if args.show_spawns {
        for enemy in EncounterGenerator::new().generate(&nav) {
            marks.push((nav.to_tile(enemy.position), 'e'));
        }
        for pickup in ItemGenerator::new().generate(&nav) {
            let glyph = match pickup.kind {
                PickupKind::Loot { .. } => 'l',
                PickupKind::Ammo { .. } => 'a',
            };
            marks.push((nav.to_tile(pickup.position), glyph));
        }
    }

    let map = nav.map();
    println!(
        "floor {} seed {:#010x} {}x{} start ({}, {}) exit ({}, {}) cover points {}",
        map.floor(),
        map.seed(),
        map.width(),
        map.height(),
        map.start().x,
        map.start().y,
        map.exit().x,
        map.exit().y,
        nav.cover_points().len()
    );
    println!("{}", map.to_ascii(&marks));
    Ok(())
}

/// Logs floor transitions.
struct LogTransitions;

impl LevelTransitionListener for LogTransitions {
    fn on_floor_advanced(&mut self, from_floor: u32, to_floor: u32, stash: &[String]) {
        info!(
            "Extracted from floor {} to floor {} with {} items in the stash",
            from_floor,
            to_floor,
            stash.len()
        );
    }

    fn on_player_died(&mut self, floor: u32) {
        info!("Player died on floor {}", floor);
    }
}

/// A bullet in flight.
#[derive(Debug, Clone, Copy)]
struct Bullet {
    owner: ShotOwner,
    position: WorldPoint,
    velocity: WorldPoint,
    damage: u32,
    expires_at: u64,
}

impl Bullet {
    fn from_shot(shot: &ShotRequest, now: u64) -> Self {
        Self {
            owner: shot.owner,
            position: shot.origin,
            velocity: WorldPoint::new(shot.angle.cos(), shot.angle.sin()).scale(shot.speed),
            damage: shot.damage,
            expires_at: now + shot.life_ms,
        }
    }
}

fn run_simulate(config: DelveConfig, args: &SimulateArgs) -> DelveResult<()> {
    if args.dt == 0 {
        return Err(DelveError::InvalidConfig("--dt must be positive".to_string()));
    }
    let settings = RaidSettings {
        base_seed: args.level.seed,
        viewport_width: args.level.viewport_width,
        viewport_height: args.level.viewport_height,
        generation: config.generation,
        tactics: config.tactics,
    };

    match &args.stash {
        Some(path) => {
            let session = RaidSession::new(
                settings,
                JsonFileStash::new(path),
                LogTransitions,
                args.level.floor,
                0,
            )?;
            simulate(session, args)
        }
        None => {
            let session = RaidSession::new(
                settings,
                MemoryStash::new(),
                LogTransitions,
                args.level.floor,
                0,
            )?;
            simulate(session, args)
        }
    }
}

fn simulate<S: StashStore>(mut session: RaidSession<S, LogTransitions>, args: &SimulateArgs) -> DelveResult<()> {
    let dt_seconds = args.dt as f64 / 1000.0;
    let mut bullets: Vec<Bullet> = Vec::new();
    let mut floor = session.state().floor();
    let mut deaths = session.deaths();

    for tick in 0..args.ticks {
        let now = tick * args.dt;
        let player = session.state().player_spawn();

        // The parked player shoots at the nearest enemy it can see.
        let target = {
            let state = session.state();
            let range = state.player().weapon.def().range;
            state
                .enemies()
                .iter()
                .filter(|e| e.position.distance(player) <= range)
                .filter(|e| state.nav().has_line_of_sight_world(player, e.position))
                .min_by(|a, b| a.position.distance(player).total_cmp(&b.position.distance(player)))
                .map(|e| e.position)
        };
        if session.state().player().weapon.mag == 0 {
            session.state_mut().player_reload(now);
        }
        if let Some(target) = target {
            if let Some(shot) = session.state_mut().player_fire(now, player, target) {
                bullets.push(Bullet::from_shot(&shot, now));
            }
        }

        let commands = session.state_mut().tick(now, player);
        for command in &commands {
            let Some(enemy) = session.state().enemy(command.enemy_id) else {
                continue;
            };
            let moved = slide(session.state().nav(), enemy.position, command.velocity.scale(dt_seconds));
            session.state_mut().set_enemy_position(command.enemy_id, moved);
            if let Some(shot) = &command.shot {
                bullets.push(Bullet::from_shot(shot, now));
            }
        }

        step_bullets(&mut session, &mut bullets, player, dt_seconds, now);

        if let Some(pickup) = session.state_mut().pick_up_nearest(player) {
            debug!("Tick {}: picked up {}", tick, pickup.name());
        }

        if let ExitStatus::Advance = session.update_exit(args.dt as f64, player, now)? {
            info!("Tick {}: floor cleared", tick);
        }

        if session.state().floor() != floor || session.deaths() != deaths {
            bullets.clear();
            floor = session.state().floor();
            deaths = session.deaths();
        }
    }

    let state = session.state();
    let stats = session.statistics();
    println!(
        "after {} ticks: floor {}, player hp {}/{}, {} enemies left, {} loot left",
        args.ticks,
        state.floor(),
        state.player().hp,
        state.player().max_hp,
        state.enemies().len(),
        state.loot_remaining()
    );
    println!(
        "shots: enemy {} player {}; damage taken {} dealt {}; kills {}; pickups {}; deaths {}; floors cleared {}",
        stats.enemy_shots,
        stats.player_shots,
        stats.damage_taken,
        stats.damage_dealt,
        stats.enemies_defeated,
        stats.items_collected,
        session.deaths(),
        session.floors_cleared()
    );
    Ok(())
}

/// Moves `from` by `delta`, one axis at a time, refusing steps into walls.
fn slide(nav: &NavGrid, from: WorldPoint, delta: WorldPoint) -> WorldPoint {
    let mut position = from;
    let horizontal = WorldPoint::new(position.x + delta.x, position.y);
    if nav.is_walkable(nav.to_tile(horizontal)) {
        position = horizontal;
    }
    let vertical = WorldPoint::new(position.x, position.y + delta.y);
    if nav.is_walkable(nav.to_tile(vertical)) {
        position = vertical;
    }
    position
}

/// Advances bullets, dropping those that expire or hit a wall and applying hits.
fn step_bullets<S: StashStore>(
    session: &mut RaidSession<S, LogTransitions>,
    bullets: &mut Vec<Bullet>,
    player: WorldPoint,
    dt_seconds: f64,
    now: u64,
) {
    let mut survivors = Vec::with_capacity(bullets.len());

    'bullets: for mut bullet in bullets.drain(..) {
        if now >= bullet.expires_at {
            continue;
        }
        let travel = bullet.velocity.scale(dt_seconds);
        let steps = (travel.length() / BULLET_SUBSTEP).ceil().max(1.0) as u32;
        let step = travel.scale(1.0 / steps as f64);

        for _ in 0..steps {
            bullet.position = bullet.position + step;
            let nav = session.state().nav();
            if nav.is_wall(nav.to_tile(bullet.position)) {
                continue 'bullets;
            }

            match bullet.owner {
                ShotOwner::Enemy(_) => {
                    if bullet.position.distance(player) <= HIT_RADIUS {
                        let outcome = session.damage_player(bullet.damage, now);
                        debug!("Player hit for {}: {:?}", bullet.damage, outcome);
                        if outcome == DamageOutcome::Killed {
                            // The session restarted on a new floor; nothing in flight survives.
                            survivors.clear();
                            break 'bullets;
                        }
                        continue 'bullets;
                    }
                }
                ShotOwner::Player => {
                    let hit = session
                        .state()
                        .enemies()
                        .iter()
                        .find(|e| e.position.distance(bullet.position) <= HIT_RADIUS)
                        .map(|e| e.id);
                    if let Some(id) = hit {
                        if let Some(DamageOutcome::Killed) =
                            session.state_mut().damage_enemy(id, bullet.damage, now)
                        {
                            debug!("Enemy {} down", id);
                        }
                        continue 'bullets;
                    }
                }
            }
        }
        survivors.push(bullet);
    }

    *bullets = survivors;
}
