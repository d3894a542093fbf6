//! JSON persistence of a memory store.

use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::entries::{ActionLogEntry, NavigationPoint, Reflection};
use super::goals::{Goal, PlanStep};
use super::store::MemoryStore;
use crate::config::MemoryConfig;
use crate::error::{Result, WayfarerError};

/// Current bundle format version.
pub const BUNDLE_VERSION: u32 = 1;

/// Portable copy of a store's ordered content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBundle {
    pub version: u32,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub plans: Vec<PlanStep>,
    #[serde(default)]
    pub reflections: Vec<Reflection>,
    #[serde(default)]
    pub action_log: Vec<ActionLogEntry>,
    #[serde(default)]
    pub navigation_points: Vec<NavigationPoint>,
}

impl MemoryBundle {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let bundle: MemoryBundle = serde_json::from_reader(BufReader::new(file))?;
        if bundle.version > BUNDLE_VERSION {
            return Err(WayfarerError::Persistence(format!(
                "{} uses bundle version {}, newest supported is {}",
                path.display(),
                bundle.version,
                BUNDLE_VERSION
            )));
        }
        Ok(bundle)
    }
}

impl MemoryStore {
    /// Snapshot the store's content.
    pub fn bundle(&self) -> MemoryBundle {
        MemoryBundle {
            version: BUNDLE_VERSION,
            goals: self.goals().to_vec(),
            plans: self.plans().to_vec(),
            reflections: self.reflections().cloned().collect(),
            action_log: self.action_log().cloned().collect(),
            navigation_points: self.navigation_points().to_vec(),
        }
    }

    /// Rebuild a store from a bundle. Caps and windows are enforced again, so
    /// a hand-edited bundle cannot smuggle in oversized state.
    pub fn from_bundle(config: MemoryConfig, bundle: MemoryBundle) -> Self {
        let mut store = MemoryStore::new(config);
        store.restore(
            bundle.goals,
            bundle.plans,
            bundle.reflections,
            bundle.action_log,
            bundle.navigation_points,
        );
        store
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.bundle().save(path)
    }

    pub fn load(config: MemoryConfig, path: impl AsRef<Path>) -> Result<Self> {
        let bundle = MemoryBundle::load(path)?;
        Ok(Self::from_bundle(config, bundle))
    }
}
