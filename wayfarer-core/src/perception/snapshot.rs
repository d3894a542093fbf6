//! The immutable per-cycle view of the world.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::bands::{DistanceBand, ElevationBand, Heading, MagnitudeBand, SignalLevel};

/// Direction, range and height of something the agent perceives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Bearing {
    pub direction: Option<Heading>,
    pub distance: DistanceBand,
    pub elevation: ElevationBand,
}

impl Bearing {
    pub fn describe(&self) -> String {
        let direction = self
            .direction
            .map(|d| d.as_str())
            .unwrap_or("unknown direction");
        format!("{}, {}, {}", direction, self.distance, self.elevation)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainFeature {
    pub description: String,
    pub bearing: Bearing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    pub description: String,
    pub bearing: Bearing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedObject {
    pub name: String,
    pub description: String,
    pub bearing: Bearing,
}

/// Movement state of a perceived character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MovementState {
    Stationary,
    Moving,
    Approaching,
    Departing,
    #[default]
    Unknown,
}

impl MovementState {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "stationary" | "idle" | "still" | "standing" => Self::Stationary,
            "moving" | "walking" | "running" => Self::Moving,
            "approaching" => Self::Approaching,
            "departing" | "leaving" => Self::Departing,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Identity
    pub name: String,
    pub role: String,
    pub movement: MovementState,
    pub bearing: Bearing,
}

/// Heading and size of the most recent displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdometryDelta {
    pub heading: Option<Heading>,
    pub magnitude: MagnitudeBand,
}

impl OdometryDelta {
    /// Heading that would retrace the last displacement, if the agent actually moved.
    pub fn backtrack_heading(&self) -> Option<Heading> {
        match self.magnitude {
            MagnitudeBand::Still | MagnitudeBand::Unknown => None,
            _ => self.heading.map(Heading::opposite),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub description: String,
    pub count: u32,
}

/// Item name to quantity/state. Read-only input to the loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Inventory {
    items: BTreeMap<String, InventoryItem>,
}

impl Inventory {
    pub fn new(items: BTreeMap<String, InventoryItem>) -> Self {
        Self { items }
    }

    pub fn get(&self, name: &str) -> Option<&InventoryItem> {
        self.items
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name.trim()))
            .map(|(_, v)| v)
    }

    /// At least one of the named item is held.
    pub fn holds(&self, name: &str) -> bool {
        self.get(name).is_some_and(|item| item.count > 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InventoryItem)> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Category of an observable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservedKind {
    Entity,
    Structure,
    Object,
}

/// A named, currently observable thing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observed<'a> {
    pub name: &'a str,
    pub kind: ObservedKind,
    pub bearing: Bearing,
}

/// Immutable snapshot produced once per cycle by the ingestor.
///
/// Downstream components only borrow it; within a cycle the reflection engine
/// and the selector see the same `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerceptionSnapshot {
    sequence: u64,
    position: Option<String>,
    terrain: Vec<TerrainFeature>,
    structures: Vec<Structure>,
    entities: Vec<Entity>,
    objects: Vec<ObservedObject>,
    obstacles: BTreeMap<Heading, SignalLevel>,
    odometry: Option<OdometryDelta>,
    weather: Vec<String>,
    inventory: Inventory,
    fingerprint: String,
}

#[derive(Serialize)]
struct FingerprintView<'a> {
    position: &'a Option<String>,
    terrain: &'a [TerrainFeature],
    structures: &'a [Structure],
    entities: &'a [Entity],
    objects: &'a [ObservedObject],
    obstacles: &'a BTreeMap<Heading, SignalLevel>,
    odometry: &'a Option<OdometryDelta>,
    weather: &'a [String],
    inventory: &'a Inventory,
}

pub(crate) struct SnapshotParts {
    pub sequence: u64,
    pub position: Option<String>,
    pub terrain: Vec<TerrainFeature>,
    pub structures: Vec<Structure>,
    pub entities: Vec<Entity>,
    pub objects: Vec<ObservedObject>,
    pub obstacles: BTreeMap<Heading, SignalLevel>,
    pub odometry: Option<OdometryDelta>,
    pub weather: Vec<String>,
    pub inventory: Inventory,
}

impl PerceptionSnapshot {
    pub(crate) fn from_parts(parts: SnapshotParts) -> Self {
        let view = FingerprintView {
            position: &parts.position,
            terrain: &parts.terrain,
            structures: &parts.structures,
            entities: &parts.entities,
            objects: &parts.objects,
            obstacles: &parts.obstacles,
            odometry: &parts.odometry,
            weather: &parts.weather,
            inventory: &parts.inventory,
        };
        // Serialization of plain data with string keys cannot fail.
        let bytes = serde_json::to_vec(&view).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let fingerprint = format!("{:x}", hasher.finalize())[..16].to_string();

        Self {
            sequence: parts.sequence,
            position: parts.position,
            terrain: parts.terrain,
            structures: parts.structures,
            entities: parts.entities,
            objects: parts.objects,
            obstacles: parts.obstacles,
            odometry: parts.odometry,
            weather: parts.weather,
            inventory: parts.inventory,
            fingerprint,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn position(&self) -> Option<&str> {
        self.position.as_deref()
    }

    pub fn terrain(&self) -> &[TerrainFeature] {
        &self.terrain
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn objects(&self) -> &[ObservedObject] {
        &self.objects
    }

    pub fn weather(&self) -> &[String] {
        &self.weather
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn odometry(&self) -> Option<&OdometryDelta> {
        self.odometry.as_ref()
    }

    /// Content hash excluding the sequence number. Equal fingerprints mean
    /// unchanged conditions.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Obstacle level for a heading; headings never reported are `Unknown`.
    pub fn signal(&self, heading: Heading) -> SignalLevel {
        self.obstacles.get(&heading).copied().unwrap_or_default()
    }

    /// All eight headings with their levels, clockwise from north.
    pub fn obstacle_readings(&self) -> Vec<(Heading, SignalLevel)> {
        Heading::ALL.iter().map(|h| (*h, self.signal(*h))).collect()
    }

    /// Headings reading intense.
    pub fn blocked_headings(&self) -> Vec<Heading> {
        Heading::ALL
            .iter()
            .copied()
            .filter(|h| self.signal(*h).is_intense())
            .collect()
    }

    /// Heading that would retrace the last displacement.
    pub fn backtrack_heading(&self) -> Option<Heading> {
        self.odometry.and_then(|o| o.backtrack_heading())
    }

    /// Every named entity, structure and object, in that order.
    pub fn observables(&self) -> Vec<Observed<'_>> {
        let entities = self.entities.iter().map(|e| Observed {
            name: e.name.as_str(),
            kind: ObservedKind::Entity,
            bearing: e.bearing,
        });
        let structures = self.structures.iter().map(|s| Observed {
            name: s.name.as_str(),
            kind: ObservedKind::Structure,
            bearing: s.bearing,
        });
        let objects = self.objects.iter().map(|o| Observed {
            name: o.name.as_str(),
            kind: ObservedKind::Object,
            bearing: o.bearing,
        });
        entities.chain(structures).chain(objects).collect()
    }

    /// Find an observable by name (case-insensitive).
    pub fn locate(&self, name: &str) -> Option<Observed<'_>> {
        let needle = name.trim();
        if needle.is_empty() {
            return None;
        }
        self.observables()
            .into_iter()
            .find(|o| o.name.eq_ignore_ascii_case(needle))
    }

    pub fn is_observable(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }

    /// Copy restricted to near/mid range, for narrow reflection contexts.
    pub fn local_slice(&self) -> PerceptionSnapshot {
        let parts = SnapshotParts {
            sequence: self.sequence,
            position: self.position.clone(),
            terrain: self
                .terrain
                .iter()
                .filter(|t| t.bearing.distance.is_local())
                .cloned()
                .collect(),
            structures: self
                .structures
                .iter()
                .filter(|s| s.bearing.distance.is_local())
                .cloned()
                .collect(),
            entities: self
                .entities
                .iter()
                .filter(|e| e.bearing.distance.is_local())
                .cloned()
                .collect(),
            objects: self
                .objects
                .iter()
                .filter(|o| o.bearing.distance.is_local())
                .cloned()
                .collect(),
            obstacles: self.obstacles.clone(),
            odometry: self.odometry,
            weather: self.weather.clone(),
            inventory: self.inventory.clone(),
        };
        PerceptionSnapshot::from_parts(parts)
    }
}
