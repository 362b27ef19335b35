//! # Item Generation
//!
//! Seeded loot and ammunition pickups for a floor.
//!
//! Loot must all be collected before the exit unlocks; ammo is optional.

use super::utils::random_walkable_point;
use crate::navigation::NavGrid;
use crate::{AmmoType, DelveError, DelveResult, Generator, Weighted, WorldPoint, XorShift32};
use serde::{Deserialize, Serialize};

/// Names loot pickups are drawn from.
pub const LOOT_NAMES: [&str; 6] = ["Scrap", "Medkit", "Artifact", "Food", "Battery", "Document"];

const AMMO_TYPES: [Weighted<AmmoType>; 3] = [
    Weighted {
        item: AmmoType::NineMm,
        weight: 0.55,
    },
    Weighted {
        item: AmmoType::FiveFiftySix,
        weight: 0.33,
    },
    Weighted {
        item: AmmoType::SevenSixtyTwo,
        weight: 0.12,
    },
];

/// What a pickup holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PickupKind {
    /// An item that goes into the inventory and counts towards the exit lock
    Loot { name: String },
    /// Rounds added to the carried weapon's reserve
    Ammo { ammo_type: AmmoType, amount: u32 },
}

/// One pickup on a fresh floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSpawn {
    pub position: WorldPoint,
    pub kind: PickupKind,
}

impl PickupSpawn {
    /// Whether this pickup is loot.
    pub fn is_loot(&self) -> bool {
        matches!(self.kind, PickupKind::Loot { .. })
    }

    /// Display name, e.g. `"Medkit"` or `"5.56 Ammo"`.
    pub fn name(&self) -> String {
        match &self.kind {
            PickupKind::Loot { name } => name.clone(),
            PickupKind::Ammo { ammo_type, .. } => format!("{} Ammo", ammo_type.label()),
        }
    }
}

/// Generates loot and ammo pickups for a level.
///
/// Loot comes first in the output, then ammo.
///
/// # Examples
///
/// ```
/// use delve::{generate_level, Generator, ItemGenerator, NavGrid};
///
/// let nav = NavGrid::new(generate_level(1, 42, 800.0, 600.0));
/// let pickups = ItemGenerator::new().generate(&nav);
/// let loot = pickups.iter().filter(|p| p.is_loot()).count();
/// assert!((6..=9).contains(&loot));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemGenerator;

impl ItemGenerator {
    pub fn new() -> Self {
        Self
    }

    fn ammo_amount(ammo_type: AmmoType, rng: &mut XorShift32) -> u32 {
        let (base, span) = match ammo_type {
            AmmoType::NineMm => (10.0, 20.0),
            AmmoType::FiveFiftySix => (18.0, 36.0),
            AmmoType::SevenSixtyTwo => (5.0, 10.0),
        };
        (base + rng.next_f64() * span).floor() as u32
    }
}

impl Generator for ItemGenerator {
    type Input = NavGrid;
    type Output = Vec<PickupSpawn>;

    fn generate(&self, nav: &NavGrid) -> Vec<PickupSpawn> {
        let mut rng = XorShift32::new(nav.map().seed() ^ crate::config::ITEM_SEED_MIX);
        let mut pickups = Vec::new();

        let loot_count = 6 + rng.index(4);
        for _ in 0..loot_count {
            let position = random_walkable_point(nav, &mut rng);
            let name = LOOT_NAMES[rng.index(LOOT_NAMES.len())].to_string();
            pickups.push(PickupSpawn {
                position,
                kind: PickupKind::Loot { name },
            });
        }

        let ammo_count = 6 + rng.index(6);
        for _ in 0..ammo_count {
            let position = random_walkable_point(nav, &mut rng);
            let ammo_type = rng
                .pick_weighted(&AMMO_TYPES)
                .copied()
                .unwrap_or(AmmoType::NineMm);
            let amount = Self::ammo_amount(ammo_type, &mut rng);
            pickups.push(PickupSpawn {
                position,
                kind: PickupKind::Ammo { ammo_type, amount },
            });
        }

        log::debug!(
            "Floor {}: placed {} loot and {} ammo pickups",
            nav.map().floor(),
            loot_count,
            ammo_count
        );
        pickups
    }

    fn validate(&self, pickups: &Vec<PickupSpawn>) -> DelveResult<()> {
        if !pickups.iter().any(PickupSpawn::is_loot) {
            return Err(DelveError::GenerationFailed(
                "floor has no loot to collect".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "ItemGenerator"
    }
}
