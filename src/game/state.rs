//! # Raid State Module
//!
//! One floor of a raid: the level, its enemies and pickups, the player's
//! weapon and inventory, and the exit objective.
//!
//! `RaidState` is the per-floor simulation. Each tick it runs every enemy's
//! tactical planner and engagement gate and hands back movement and shot
//! commands; it owns no physics. The caller integrates movement, resolves
//! bullets and reports positions and hits back. `RaidSession` sits on top and
//! handles floor transitions, death restarts and the stash.

use crate::generation::{
    BspDungeonGenerator, EncounterGenerator, Generator, ItemGenerator, LevelRequest, PickupKind,
    PickupSpawn,
};
use crate::navigation::NavGrid;
use crate::tactics::{should_engage, GoalKind, Role, TacticalConfig, TacticalPlanner, TacticalState};
use crate::{
    DelveResult, GenerationConfig, LevelTransitionListener, StashStore, WeaponId, WeaponState,
    WorldPoint,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Smallest viewport a floor is sized for, in world units.
pub const MIN_VIEWPORT: (f64, f64) = (320.0, 240.0);

/// Spare rounds the player starts each floor with.
pub const PLAYER_START_RESERVE: u32 = 60;

/// Upper bound of the random delay added to each enemy shot, in milliseconds.
const ENEMY_FIRE_JITTER_MS: u64 = 60;

/// Everything needed to build a floor besides its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaidSettings {
    /// Seed shared by every floor of the run
    pub base_seed: u32,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub generation: GenerationConfig,
    pub tactics: TacticalConfig,
}

impl RaidSettings {
    /// Settings with default tuning.
    pub fn new(base_seed: u32, viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            base_seed,
            viewport_width,
            viewport_height,
            generation: GenerationConfig::new(),
            tactics: TacticalConfig::new(),
        }
    }

    /// Validates both tuning sections.
    pub fn validate(&self) -> DelveResult<()> {
        self.generation.validate()?;
        self.tactics.validate()
    }

    /// The level request for `floor`, with the viewport raised to the minimum.
    pub fn level_request(&self, floor: u32) -> LevelRequest {
        LevelRequest::new(
            floor,
            self.base_seed,
            self.viewport_width.max(MIN_VIEWPORT.0),
            self.viewport_height.max(MIN_VIEWPORT.1),
        )
    }
}

/// The player's side of the raid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub hp: u32,
    pub max_hp: u32,
    pub weapon: WeaponState,
    /// Loot carried on this floor, moved to the stash on extraction
    pub inventory: Vec<String>,
}

impl Player {
    /// Full health, a loaded pistol and empty pockets.
    pub fn new() -> Self {
        Self {
            hp: crate::config::PLAYER_MAX_HP,
            max_hp: crate::config::PLAYER_MAX_HP,
            weapon: WeaponState::new(WeaponId::Pistol, PLAYER_START_RESERVE),
            inventory: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

/// A live enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    /// Last position reported by the physics collaborator
    pub position: WorldPoint,
    pub hp: u32,
    pub weapon: WeaponState,
    pub tactics: TacticalState,
}

impl Enemy {
    pub fn role(&self) -> Role {
        self.tactics.role
    }
}

/// Who fired a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOwner {
    Player,
    Enemy(u32),
}

/// A bullet the physics collaborator should spawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotRequest {
    pub owner: ShotOwner,
    pub origin: WorldPoint,
    /// Travel direction in radians, spread already applied
    pub angle: f64,
    pub speed: f64,
    pub damage: u32,
    pub life_ms: u64,
}

/// Per-enemy output of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyCommand {
    pub enemy_id: u32,
    /// Desired velocity in world units per second
    pub velocity: WorldPoint,
    /// Bearing towards the threat, for orienting the sprite
    pub facing: f64,
    pub goal_kind: GoalKind,
    pub shot: Option<ShotRequest>,
}

/// Result of applying damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Wounded { remaining: u32 },
    Killed,
}

/// State of the exit objective after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitStatus {
    /// Player is outside the exit zone; progress decays
    Outside { progress_ms: f64 },
    /// Player is in the zone but objectives remain
    Locked {
        loot_remaining: usize,
        enemies_remaining: usize,
    },
    /// Player is holding the unlocked exit
    Holding { progress_ms: f64 },
    /// The hold completed; the floor is cleared
    Advance,
}

/// Counters for one floor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidStatistics {
    /// Shots fired by enemies
    pub enemy_shots: u32,
    /// Shots fired by the player
    pub player_shots: u32,
    pub damage_taken: u64,
    pub damage_dealt: u64,
    pub enemies_defeated: u32,
    pub items_collected: u32,
}

impl RaidStatistics {
    /// Adds another floor's counters to these.
    pub fn absorb(&mut self, other: &RaidStatistics) {
        self.enemy_shots += other.enemy_shots;
        self.player_shots += other.player_shots;
        self.damage_taken += other.damage_taken;
        self.damage_dealt += other.damage_dealt;
        self.enemies_defeated += other.enemies_defeated;
        self.items_collected += other.items_collected;
    }
}

/// One floor of a raid.
///
/// # Examples
///
/// ```
/// use delve::{RaidSettings, RaidState};
///
/// let settings = RaidSettings::new(42, 800.0, 600.0);
/// let mut raid = RaidState::new(1, &settings, 0);
/// let player = raid.player_spawn();
/// let commands = raid.tick(16, player);
/// assert_eq!(commands.len(), raid.enemies().len());
/// ```
#[derive(Debug, Clone)]
pub struct RaidState {
    floor: u32,
    nav: NavGrid,
    tactics: TacticalConfig,
    enemies: Vec<Enemy>,
    pickups: Vec<PickupSpawn>,
    player: Player,
    loot_remaining: usize,
    exit_progress_ms: f64,
    statistics: RaidStatistics,
    rng: StdRng,
}

impl RaidState {
    /// Generates `floor` and populates it. `now` anchors the enemies' first-shot timers.
    pub fn new(floor: u32, settings: &RaidSettings, now: u64) -> Self {
        let generator = BspDungeonGenerator::with_config(settings.generation.clone());
        let map = generator.generate(&settings.level_request(floor));
        let nav = NavGrid::new(map);

        let enemies: Vec<Enemy> = EncounterGenerator::new()
            .generate(&nav)
            .into_iter()
            .enumerate()
            .map(|(i, spawn)| {
                let mut weapon = WeaponState::new(spawn.weapon, spawn.reserve);
                weapon.mag = spawn.mag;
                weapon.next_shot_at = now + spawn.first_shot_delay_ms;
                Enemy {
                    id: i as u32,
                    position: spawn.position,
                    hp: spawn.hp,
                    weapon,
                    tactics: TacticalState::new(spawn.role),
                }
            })
            .collect();
        let pickups = ItemGenerator::new().generate(&nav);
        let loot_remaining = pickups.iter().filter(|p| p.is_loot()).count();
        let rng = StdRng::seed_from_u64(nav.map().seed() as u64);

        log::info!(
            "Floor {} ready: {} enemies, {} loot, {} pickups total",
            floor,
            enemies.len(),
            loot_remaining,
            pickups.len()
        );

        Self {
            floor,
            nav,
            tactics: settings.tactics.clone(),
            enemies,
            pickups,
            player: Player::new(),
            loot_remaining,
            exit_progress_ms: 0.0,
            statistics: RaidStatistics::default(),
            rng,
        }
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    pub fn nav(&self) -> &NavGrid {
        &self.nav
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn pickups(&self) -> &[PickupSpawn] {
        &self.pickups
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn loot_remaining(&self) -> usize {
        self.loot_remaining
    }

    pub fn exit_progress_ms(&self) -> f64 {
        self.exit_progress_ms
    }

    pub fn statistics(&self) -> &RaidStatistics {
        &self.statistics
    }

    /// World-space centre of the start tile.
    pub fn player_spawn(&self) -> WorldPoint {
        self.nav.to_world_center(self.nav.map().start())
    }

    /// World-space centre of the exit tile.
    pub fn exit_point(&self) -> WorldPoint {
        self.nav.to_world_center(self.nav.map().exit())
    }

    /// Runs one simulation tick for every live enemy against the player at
    /// `player_position`.
    ///
    /// Movement and firing are decided independently: whatever goal the
    /// planner picks, an enemy that sees the player in range with a ready
    /// weapon fires.
    pub fn tick(&mut self, now: u64, player_position: WorldPoint) -> Vec<EnemyCommand> {
        self.player.weapon.finish_reload_if_due(now);

        let planner = TacticalPlanner::new(&self.nav, &self.tactics);
        let mut commands = Vec::with_capacity(self.enemies.len());

        for enemy in self.enemies.iter_mut() {
            enemy.weapon.finish_reload_if_due(now);
            let decision = planner.update(&mut enemy.tactics, enemy.position, player_position, now);

            let mut shot = None;
            if !enemy.weapon.is_out_of_ammo() {
                if enemy.weapon.mag == 0 {
                    enemy.weapon.start_reload(now);
                }
                if should_engage(&decision, &enemy.weapon, now) {
                    let jitter = self.rng.gen_range(0..=ENEMY_FIRE_JITTER_MS);
                    if enemy.weapon.consume_shot(now, jitter) {
                        let def = enemy.weapon.def();
                        let multiplier = match enemy.tactics.role {
                            Role::Flank => 1.9,
                            Role::Suppress => 1.25,
                        };
                        let spread = def.spread_rad * multiplier;
                        let angle = enemy.position.bearing_to(player_position)
                            + self.rng.gen_range(-spread..=spread);
                        shot = Some(ShotRequest {
                            owner: ShotOwner::Enemy(enemy.id),
                            origin: enemy.position,
                            angle,
                            speed: def.bullet_speed,
                            damage: enemy.weapon.weapon.enemy_damage(),
                            life_ms: def.bullet_life_ms,
                        });
                        self.statistics.enemy_shots += 1;
                    }
                }
            }

            commands.push(EnemyCommand {
                enemy_id: enemy.id,
                velocity: decision.velocity,
                facing: enemy.position.bearing_to(player_position),
                goal_kind: decision.goal_kind,
                shot,
            });
        }
        commands
    }

    /// Records where the physics collaborator moved an enemy.
    ///
    /// Returns `false` for an unknown or dead enemy.
    pub fn set_enemy_position(&mut self, id: u32, position: WorldPoint) -> bool {
        match self.enemies.iter_mut().find(|e| e.id == id) {
            Some(enemy) => {
                enemy.position = position;
                true
            }
            None => false,
        }
    }

    /// Applies a hit to an enemy and records it for the threat response.
    ///
    /// Dead enemies are removed. Returns `None` for an unknown enemy.
    pub fn damage_enemy(&mut self, id: u32, amount: u32, now: u64) -> Option<DamageOutcome> {
        let index = self.enemies.iter().position(|e| e.id == id)?;
        let enemy = &mut self.enemies[index];
        let dealt = amount.min(enemy.hp);
        enemy.hp -= dealt;
        enemy.tactics.record_damage(now);
        self.statistics.damage_dealt += dealt as u64;

        if enemy.hp == 0 {
            self.enemies.remove(index);
            self.statistics.enemies_defeated += 1;
            log::debug!("Enemy {} killed, {} remaining", id, self.enemies.len());
            Some(DamageOutcome::Killed)
        } else {
            Some(DamageOutcome::Wounded {
                remaining: enemy.hp,
            })
        }
    }

    /// Applies a hit to the player.
    pub fn damage_player(&mut self, amount: u32) -> DamageOutcome {
        let dealt = amount.min(self.player.hp);
        self.player.hp -= dealt;
        self.statistics.damage_taken += dealt as u64;
        if self.player.is_alive() {
            DamageOutcome::Wounded {
                remaining: self.player.hp,
            }
        } else {
            DamageOutcome::Killed
        }
    }

    /// Fires the player's weapon at `target` if it is ready.
    ///
    /// An empty magazine only refuses the shot; reloading is always an
    /// explicit [`RaidState::player_reload`].
    pub fn player_fire(&mut self, now: u64, origin: WorldPoint, target: WorldPoint) -> Option<ShotRequest> {
        let weapon = &mut self.player.weapon;
        weapon.finish_reload_if_due(now);
        if weapon.mag == 0 {
            log::debug!("Empty mag, reload required");
            return None;
        }
        if !weapon.consume_shot(now, 0) {
            return None;
        }

        let def = weapon.def();
        let angle = origin.bearing_to(target) + self.rng.gen_range(-def.spread_rad..=def.spread_rad);
        self.statistics.player_shots += 1;
        Some(ShotRequest {
            owner: ShotOwner::Player,
            origin,
            angle,
            speed: def.bullet_speed,
            damage: def.damage,
            life_ms: def.bullet_life_ms,
        })
    }

    /// Starts a player reload. Returns `false` if one cannot start.
    pub fn player_reload(&mut self, now: u64) -> bool {
        self.player.weapon.start_reload(now)
    }

    /// Picks up the closest pickup within reach of the player.
    ///
    /// Ammo goes to the carried weapon's reserve; loot goes to the inventory
    /// and counts down the exit lock.
    pub fn pick_up_nearest(&mut self, player_position: WorldPoint) -> Option<PickupSpawn> {
        let (index, _) = self
            .pickups
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.position.distance(player_position)))
            .filter(|(_, d)| *d <= crate::config::PICKUP_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        let pickup = self.pickups.remove(index);
        match &pickup.kind {
            PickupKind::Ammo { amount, .. } => {
                self.player.weapon.reserve += amount;
            }
            PickupKind::Loot { name } => {
                self.player.inventory.push(name.clone());
                self.loot_remaining = self.loot_remaining.saturating_sub(1);
            }
        }
        self.statistics.items_collected += 1;
        log::debug!("Picked up {}", pickup.name());
        Some(pickup)
    }

    /// Whether `position` lies in the 3x3 tile square around the exit.
    pub fn in_exit_zone(&self, position: WorldPoint) -> bool {
        let tile = self.nav.to_tile(position);
        let exit = self.nav.map().exit();
        (tile.x - exit.x).abs() <= 1 && (tile.y - exit.y).abs() <= 1
    }

    /// Advances the exit objective by `dt_ms`.
    ///
    /// Outside the zone progress decays at twice the rate it builds. Inside,
    /// remaining loot or enemies lock the exit and reset progress; otherwise
    /// progress builds until the hold time is reached.
    pub fn update_exit(&mut self, dt_ms: f64, player_position: WorldPoint) -> ExitStatus {
        if !self.in_exit_zone(player_position) {
            self.exit_progress_ms = (self.exit_progress_ms - dt_ms * 2.0).max(0.0);
            return ExitStatus::Outside {
                progress_ms: self.exit_progress_ms,
            };
        }

        if self.loot_remaining > 0 || !self.enemies.is_empty() {
            self.exit_progress_ms = 0.0;
            return ExitStatus::Locked {
                loot_remaining: self.loot_remaining,
                enemies_remaining: self.enemies.len(),
            };
        }

        self.exit_progress_ms += dt_ms;
        if self.exit_progress_ms >= crate::config::EXIT_HOLD_MS as f64 {
            ExitStatus::Advance
        } else {
            ExitStatus::Holding {
                progress_ms: self.exit_progress_ms,
            }
        }
    }
}

/// A run across floors: the live floor plus the persistent stash.
pub struct RaidSession<S: StashStore, L: LevelTransitionListener> {
    settings: RaidSettings,
    state: RaidState,
    stash: Vec<String>,
    store: S,
    listener: L,
    /// Counters from finished floors
    totals: RaidStatistics,
    floors_cleared: u32,
    deaths: u32,
}

impl<S: StashStore, L: LevelTransitionListener> RaidSession<S, L> {
    /// Loads the stash and builds `floor`.
    pub fn new(settings: RaidSettings, mut store: S, listener: L, floor: u32, now: u64) -> DelveResult<Self> {
        settings.validate()?;
        let stash = store.load()?;
        let state = RaidState::new(floor, &settings, now);
        Ok(Self {
            settings,
            state,
            stash,
            store,
            listener,
            totals: RaidStatistics::default(),
            floors_cleared: 0,
            deaths: 0,
        })
    }

    pub fn state(&self) -> &RaidState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RaidState {
        &mut self.state
    }

    pub fn settings(&self) -> &RaidSettings {
        &self.settings
    }

    pub fn stash(&self) -> &[String] {
        &self.stash
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn floors_cleared(&self) -> u32 {
        self.floors_cleared
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Counters across finished floors plus the live one.
    pub fn statistics(&self) -> RaidStatistics {
        let mut totals = self.totals.clone();
        totals.absorb(self.state.statistics());
        totals
    }

    /// Runs the exit objective and advances the floor when it completes.
    pub fn update_exit(&mut self, dt_ms: f64, player_position: WorldPoint, now: u64) -> DelveResult<ExitStatus> {
        let status = self.state.update_exit(dt_ms, player_position);
        if status == ExitStatus::Advance {
            self.advance_floor(now)?;
        }
        Ok(status)
    }

    /// Banks the inventory, saves the stash and builds the next floor.
    pub fn advance_floor(&mut self, now: u64) -> DelveResult<()> {
        let from = self.state.floor();
        let to = from + 1;
        self.stash.append(&mut self.state.player_mut().inventory);
        self.store.save(&self.stash)?;
        self.listener.on_floor_advanced(from, to, &self.stash);
        log::info!("Cleared floor {}, stash now holds {} items", from, self.stash.len());

        self.totals.absorb(self.state.statistics());
        self.floors_cleared += 1;
        self.state = RaidState::new(to, &self.settings, now);
        Ok(())
    }

    /// Applies a hit to the player, restarting at floor 1 on death.
    pub fn damage_player(&mut self, amount: u32, now: u64) -> DamageOutcome {
        let outcome = self.state.damage_player(amount);
        if outcome == DamageOutcome::Killed {
            self.handle_death(now);
        }
        outcome
    }

    /// Drops the carried inventory and restarts the run at floor 1.
    pub fn handle_death(&mut self, now: u64) {
        let floor = self.state.floor();
        log::info!("Player died on floor {}, restarting at floor 1", floor);
        self.listener.on_player_died(floor);
        self.totals.absorb(self.state.statistics());
        self.deaths += 1;
        self.state = RaidState::new(1, &self.settings, now);
    }
}
