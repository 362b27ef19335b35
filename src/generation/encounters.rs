//! # Encounter Generation
//!
//! Seeded enemy roster for a floor: where each enemy stands, what it carries
//! and which tactical role it plays.
//!
//! The roster draws from its own PRNG stream seeded from the level seed, so
//! it is fixed by the level alone and independent of pickup placement.

use super::utils::random_walkable_point;
use crate::navigation::NavGrid;
use crate::{
    DelveError, DelveResult, Generator, Role, WeaponId, Weighted, WorldPoint, XorShift32,
};
use serde::{Deserialize, Serialize};

/// One enemy to place on a fresh floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// World-space spawn point (a tile centre)
    pub position: WorldPoint,
    pub weapon: WeaponId,
    /// Rounds loaded at spawn, between one and a full magazine
    pub mag: u32,
    pub reserve: u32,
    /// Delay after spawn before the first shot, in milliseconds
    pub first_shot_delay_ms: u64,
    pub hp: u32,
    pub role: Role,
}

/// Weapon mix for enemies.
const ENEMY_WEAPONS: [Weighted<WeaponId>; 3] = [
    Weighted {
        item: WeaponId::Pistol,
        weight: 0.55,
    },
    Weighted {
        item: WeaponId::AssaultRifle,
        weight: 0.33,
    },
    Weighted {
        item: WeaponId::Sniper,
        weight: 0.12,
    },
];

/// Generates the enemy roster for a level.
///
/// # Examples
///
/// ```
/// use delve::{generate_level, EncounterGenerator, Generator, NavGrid};
///
/// let nav = NavGrid::new(generate_level(1, 42, 800.0, 600.0));
/// let enemies = EncounterGenerator::new().generate(&nav);
/// assert_eq!(enemies.len(), EncounterGenerator::enemy_count(1));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EncounterGenerator;

impl EncounterGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Enemies on `floor`: `6 + floor(floor * 1.15)`, capped.
    pub fn enemy_count(floor: u32) -> usize {
        let scaled = (floor as f64 * 1.15).floor() as usize;
        (6 + scaled).min(crate::config::MAX_ENEMIES)
    }

    /// Enemy hit points on `floor`.
    pub fn enemy_hp(floor: u32) -> u32 {
        50 + floor.saturating_mul(4).min(55)
    }

    fn spawn(index: usize, floor: u32, nav: &NavGrid, rng: &mut XorShift32) -> EnemySpawn {
        let position = random_walkable_point(nav, rng);
        let weapon = rng
            .pick_weighted(&ENEMY_WEAPONS)
            .copied()
            .unwrap_or(WeaponId::Pistol);
        let mag_size = weapon.def().mag_size;
        let loaded = (mag_size as f64 * (0.6 + rng.next_f64() * 0.4)).floor() as u32;
        let first_shot_delay_ms = (300.0 + rng.next_f64() * 900.0).floor() as u64;

        EnemySpawn {
            position,
            weapon,
            mag: loaded.max(1).min(mag_size),
            reserve: weapon.enemy_reserve(),
            first_shot_delay_ms,
            hp: Self::enemy_hp(floor),
            role: if index % 3 == 0 {
                Role::Suppress
            } else {
                Role::Flank
            },
        }
    }
}

impl Generator for EncounterGenerator {
    type Input = NavGrid;
    type Output = Vec<EnemySpawn>;

    fn generate(&self, nav: &NavGrid) -> Vec<EnemySpawn> {
        let map = nav.map();
        let mut rng = XorShift32::new(map.seed() ^ crate::config::ENCOUNTER_SEED_MIX);
        let count = Self::enemy_count(map.floor());

        let roster: Vec<EnemySpawn> = (0..count)
            .map(|i| Self::spawn(i, map.floor(), nav, &mut rng))
            .collect();
        log::debug!(
            "Floor {}: spawned {} enemies ({} suppress)",
            map.floor(),
            roster.len(),
            roster.iter().filter(|e| e.role == Role::Suppress).count()
        );
        roster
    }

    fn validate(&self, roster: &Vec<EnemySpawn>) -> DelveResult<()> {
        if roster.len() > crate::config::MAX_ENEMIES {
            return Err(DelveError::GenerationFailed(format!(
                "{} enemies exceeds the cap of {}",
                roster.len(),
                crate::config::MAX_ENEMIES
            )));
        }
        for enemy in roster {
            if enemy.mag == 0 || enemy.mag > enemy.weapon.def().mag_size {
                return Err(DelveError::GenerationFailed(format!(
                    "enemy magazine {} out of range for {:?}",
                    enemy.mag, enemy.weapon
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "EncounterGenerator"
    }
}
