//! # Weapons
//!
//! Weapon definitions and the fire/reload timer state machine.
//!
//! The tactical layer never looks inside a `WeaponState`; it only asks whether
//! the weapon can fire now and what its range is. Times are simulation
//! milliseconds.

use serde::{Deserialize, Serialize};

/// Ammunition calibres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmmoType {
    #[serde(rename = "9mm")]
    NineMm,
    #[serde(rename = "5.56")]
    FiveFiftySix,
    #[serde(rename = "7.62")]
    SevenSixtyTwo,
}

impl AmmoType {
    /// Display label, e.g. `"5.56"`.
    pub fn label(self) -> &'static str {
        match self {
            AmmoType::NineMm => "9mm",
            AmmoType::FiveFiftySix => "5.56",
            AmmoType::SevenSixtyTwo => "7.62",
        }
    }
}

/// Weapon archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponId {
    Pistol,
    AssaultRifle,
    Sniper,
}

/// Static tuning for one weapon archetype.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponDef {
    pub id: WeaponId,
    pub name: &'static str,
    pub ammo_type: AmmoType,
    /// Rounds per magazine
    pub mag_size: u32,
    /// Minimum time between shots
    pub fire_delay_ms: u64,
    /// Time a reload takes
    pub reload_ms: u64,
    /// Projectile speed in world units per second
    pub bullet_speed: f64,
    /// Projectile lifetime
    pub bullet_life_ms: u64,
    /// Damage dealt by the player's shots
    pub damage: u32,
    /// Half-width of the random spread cone in radians
    pub spread_rad: f64,
    /// Maximum engagement distance in world units
    pub range: f64,
}

const PISTOL: WeaponDef = WeaponDef {
    id: WeaponId::Pistol,
    name: "Pistol",
    ammo_type: AmmoType::NineMm,
    mag_size: 12,
    fire_delay_ms: 150,
    reload_ms: 900,
    bullet_speed: 760.0,
    bullet_life_ms: 900,
    damage: 16,
    spread_rad: 0.05,
    range: 520.0,
};

const ASSAULT_RIFLE: WeaponDef = WeaponDef {
    id: WeaponId::AssaultRifle,
    name: "Assault Rifle",
    ammo_type: AmmoType::FiveFiftySix,
    mag_size: 30,
    fire_delay_ms: 95,
    reload_ms: 1200,
    bullet_speed: 900.0,
    bullet_life_ms: 1050,
    damage: 12,
    spread_rad: 0.06,
    range: 720.0,
};

const SNIPER: WeaponDef = WeaponDef {
    id: WeaponId::Sniper,
    name: "Sniper",
    ammo_type: AmmoType::SevenSixtyTwo,
    mag_size: 5,
    fire_delay_ms: 900,
    reload_ms: 1500,
    bullet_speed: 1300.0,
    bullet_life_ms: 1400,
    damage: 42,
    spread_rad: 0.01,
    range: 980.0,
};

impl WeaponId {
    /// The static definition for this weapon.
    pub fn def(self) -> &'static WeaponDef {
        match self {
            WeaponId::Pistol => &PISTOL,
            WeaponId::AssaultRifle => &ASSAULT_RIFLE,
            WeaponId::Sniper => &SNIPER,
        }
    }

    /// Damage an enemy wielding this weapon deals to the player.
    ///
    /// Lower than what the player deals with the same weapon.
    pub fn enemy_damage(self) -> u32 {
        match self {
            WeaponId::Pistol => 6,
            WeaponId::AssaultRifle => 7,
            WeaponId::Sniper => 18,
        }
    }

    /// Reserve rounds an enemy spawns with.
    pub fn enemy_reserve(self) -> u32 {
        match self {
            WeaponId::Pistol => 36,
            WeaponId::AssaultRifle => 90,
            WeaponId::Sniper => 20,
        }
    }
}

/// Mutable magazine and timer state for one carried weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponState {
    pub weapon: WeaponId,
    /// Rounds in the magazine
    pub mag: u32,
    /// Rounds carried outside the magazine
    pub reserve: u32,
    /// Earliest time the next shot may be fired
    pub next_shot_at: u64,
    /// Reload completion time, `None` when not reloading
    pub reloading_until: Option<u64>,
}

impl WeaponState {
    /// A full magazine plus `reserve` spare rounds.
    pub fn new(weapon: WeaponId, reserve: u32) -> Self {
        Self {
            weapon,
            mag: weapon.def().mag_size,
            reserve,
            next_shot_at: 0,
            reloading_until: None,
        }
    }

    /// The static definition of the carried weapon.
    pub fn def(&self) -> &'static WeaponDef {
        self.weapon.def()
    }

    /// Whether a shot may be fired at `now`.
    pub fn can_shoot(&self, now: u64) -> bool {
        self.reloading_until.is_none() && self.mag > 0 && now >= self.next_shot_at
    }

    /// True when both the magazine and the reserve are empty.
    pub fn is_out_of_ammo(&self) -> bool {
        self.mag == 0 && self.reserve == 0
    }

    /// Spends one round and schedules the next shot `fire_delay + extra_delay_ms` out.
    ///
    /// Returns `false` without changing anything if the weapon cannot fire.
    pub fn consume_shot(&mut self, now: u64, extra_delay_ms: u64) -> bool {
        if !self.can_shoot(now) {
            return false;
        }
        self.mag -= 1;
        self.next_shot_at = now + self.def().fire_delay_ms + extra_delay_ms;
        true
    }

    /// Starts a reload unless one is running, the magazine is full, or the
    /// reserve is empty.
    pub fn start_reload(&mut self, now: u64) -> bool {
        if self.reloading_until.is_some() || self.mag >= self.def().mag_size || self.reserve == 0 {
            return false;
        }
        self.reloading_until = Some(now + self.def().reload_ms);
        true
    }

    /// Completes a running reload whose timer has elapsed.
    pub fn finish_reload_if_due(&mut self, now: u64) -> bool {
        match self.reloading_until {
            Some(until) if now >= until => {
                self.reloading_until = None;
                let need = self.def().mag_size.saturating_sub(self.mag);
                let take = need.min(self.reserve);
                self.mag += take;
                self.reserve -= take;
                true
            }
            _ => false,
        }
    }
}
