//! # Persistence
//!
//! Stash storage and level-transition notifications.
//!
//! The raid loop never touches the filesystem directly. It is handed a
//! `StashStore` for the items carried out of each floor and a
//! `LevelTransitionListener` for floor changes, so tests and headless runs
//! can substitute in-memory versions.

use crate::DelveResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout of the stash file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    /// Item names extracted from completed floors
    pub stash: Vec<String>,
}

/// Storage for items extracted across raids.
pub trait StashStore {
    /// Loads the stash. Missing or unreadable data yields an empty stash.
    fn load(&mut self) -> DelveResult<Vec<String>>;

    /// Replaces the stored stash.
    fn save(&mut self, stash: &[String]) -> DelveResult<()>;
}

/// Receives floor transitions from the raid loop.
pub trait LevelTransitionListener {
    /// Called after the player cleared `from_floor` and the stash was saved.
    fn on_floor_advanced(&mut self, from_floor: u32, to_floor: u32, stash: &[String]);

    /// Called when the player died on `floor`; the raid restarts at floor 1.
    fn on_player_died(&mut self, floor: u32);
}

/// Listener that ignores every transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransitions;

impl LevelTransitionListener for NoopTransitions {
    fn on_floor_advanced(&mut self, _from_floor: u32, _to_floor: u32, _stash: &[String]) {}

    fn on_player_died(&mut self, _floor: u32) {}
}

/// Stash kept in memory, for tests and headless simulation.
#[derive(Debug, Default, Clone)]
pub struct MemoryStash {
    pub items: Vec<String>,
    /// Number of successful `save` calls
    pub saves: u32,
}

impl MemoryStash {
    /// Creates an empty in-memory stash.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StashStore for MemoryStash {
    fn load(&mut self) -> DelveResult<Vec<String>> {
        Ok(self.items.clone())
    }

    fn save(&mut self, stash: &[String]) -> DelveResult<()> {
        self.items = stash.to_vec();
        self.saves += 1;
        Ok(())
    }
}

/// Stash persisted as a small JSON document.
///
/// Loading is forgiving: a missing file, malformed JSON, or non-string
/// entries all degrade to what can be salvaged instead of failing the raid.
#[derive(Debug, Clone)]
pub struct JsonFileStash {
    path: PathBuf,
}

impl JsonFileStash {
    /// Creates a store backed by `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StashStore for JsonFileStash {
    fn load(&mut self) -> DelveResult<Vec<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let parsed: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Ignoring corrupt stash file {}: {}", self.path.display(), e);
                return Ok(Vec::new());
            }
        };

        let stash = parsed
            .get("stash")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(stash)
    }

    fn save(&mut self, stash: &[String]) -> DelveResult<()> {
        let data = SaveData {
            stash: stash.to_vec(),
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string(&data)?)?;
        Ok(())
    }
}
