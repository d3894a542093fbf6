//! Raw sensor bundle to `PerceptionSnapshot`.

use std::collections::BTreeMap;

use super::bands::{DistanceBand, ElevationBand, Heading, MagnitudeBand, SignalLevel};
use super::raw::{RawCharacter, RawFeature, RawPlacement, RawSensorBundle, RawSignal};
use super::snapshot::{
    Bearing, Entity, Inventory, InventoryItem, MovementState, ObservedObject, OdometryDelta,
    PerceptionSnapshot, SnapshotParts, Structure, TerrainFeature,
};
use crate::config::PerceptionConfig;

/// Pure transform from raw feeds to a qualitative snapshot.
///
/// Sensor gaps never escalate: missing headings read `Unknown`, missing
/// distances band as `Unknown`, unnamed targets are dropped.
#[derive(Debug, Clone, Default)]
pub struct PerceptionIngestor {
    config: PerceptionConfig,
}

impl PerceptionIngestor {
    pub fn new(config: PerceptionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Produce the snapshot for cycle `sequence`.
    pub fn ingest(&self, sequence: u64, raw: &RawSensorBundle) -> PerceptionSnapshot {
        let parts = SnapshotParts {
            sequence,
            position: non_empty(raw.position.as_deref()),
            terrain: raw
                .terrain
                .iter()
                .filter_map(|t| self.terrain(t))
                .collect(),
            structures: raw
                .structures
                .iter()
                .filter_map(|s| self.structure(s))
                .collect(),
            entities: raw
                .characters
                .iter()
                .filter_map(|c| self.entity(c))
                .collect(),
            objects: raw.objects.iter().filter_map(|o| self.object(o)).collect(),
            obstacles: self.obstacles(raw),
            odometry: self.odometry(raw),
            weather: raw
                .weather
                .iter()
                .filter_map(|w| non_empty(Some(w.as_str())))
                .collect(),
            inventory: self.inventory(raw),
        };

        let snapshot = PerceptionSnapshot::from_parts(parts);
        tracing::debug!(
            sequence,
            entities = snapshot.entities().len(),
            blocked = snapshot.blocked_headings().len(),
            fingerprint = %snapshot.fingerprint(),
            "Perception snapshot ingested"
        );
        snapshot
    }

    fn bearing(&self, placement: &RawPlacement) -> Bearing {
        let direction = placement.direction.as_deref().and_then(Heading::parse);
        let distance = match (placement.distance, placement.distance_label.as_deref()) {
            (Some(d), _) => DistanceBand::from_distance(d, &self.config),
            (None, Some(label)) => DistanceBand::from_label(label),
            (None, None) => DistanceBand::Unknown,
        };
        let elevation = placement
            .elevation
            .map(|e| ElevationBand::from_delta(e, self.config.level_tolerance))
            .unwrap_or_default();

        Bearing {
            direction,
            distance,
            elevation,
        }
    }

    fn terrain(&self, raw: &RawFeature) -> Option<TerrainFeature> {
        let description = non_empty(raw.description.as_deref())
            .or_else(|| non_empty(raw.name.as_deref()))?;
        Some(TerrainFeature {
            description,
            bearing: self.bearing(&raw.placement),
        })
    }

    fn structure(&self, raw: &RawFeature) -> Option<Structure> {
        let Some(name) = non_empty(raw.name.as_deref()) else {
            tracing::debug!("Dropping unnamed structure");
            return None;
        };
        Some(Structure {
            name,
            description: raw.description.clone().unwrap_or_default(),
            bearing: self.bearing(&raw.placement),
        })
    }

    fn object(&self, raw: &RawFeature) -> Option<ObservedObject> {
        let Some(name) = non_empty(raw.name.as_deref()) else {
            tracing::debug!("Dropping unnamed object");
            return None;
        };
        Some(ObservedObject {
            name,
            description: raw.description.clone().unwrap_or_default(),
            bearing: self.bearing(&raw.placement),
        })
    }

    fn entity(&self, raw: &RawCharacter) -> Option<Entity> {
        let Some(name) = non_empty(raw.name.as_deref()) else {
            tracing::debug!("Dropping unnamed character");
            return None;
        };
        Some(Entity {
            name,
            role: non_empty(raw.role.as_deref()).unwrap_or_else(|| "unknown".to_string()),
            movement: raw
                .movement
                .as_deref()
                .map(MovementState::from_label)
                .unwrap_or_default(),
            bearing: self.bearing(&raw.placement),
        })
    }

    fn obstacles(&self, raw: &RawSensorBundle) -> BTreeMap<Heading, SignalLevel> {
        let mut readings = BTreeMap::new();
        for reading in &raw.obstacles {
            let Some(heading) = Heading::parse(&reading.heading) else {
                tracing::debug!(heading = %reading.heading, "Ignoring obstacle reading with unknown heading");
                continue;
            };
            let level = match &reading.signal {
                Some(RawSignal::Strength(s)) => SignalLevel::from_strength(*s, &self.config.signal),
                Some(RawSignal::Label(l)) => SignalLevel::from_label(l),
                None => SignalLevel::Unknown,
            };
            // Two readings for one sector: keep the more obstructed one.
            readings
                .entry(heading)
                .and_modify(|existing: &mut SignalLevel| {
                    if level.obstruction_rank() > existing.obstruction_rank() {
                        *existing = level;
                    }
                })
                .or_insert(level);
        }
        readings
    }

    fn odometry(&self, raw: &RawSensorBundle) -> Option<OdometryDelta> {
        let last = raw.displacement.last()?;
        let heading = last.heading.as_deref().and_then(Heading::parse);
        let magnitude = last
            .distance
            .map(|d| MagnitudeBand::from_magnitude(d, &self.config.odometry))
            .unwrap_or_default();
        Some(OdometryDelta { heading, magnitude })
    }

    fn inventory(&self, raw: &RawSensorBundle) -> Inventory {
        let mut items = BTreeMap::new();
        for item in &raw.inventory {
            let Some(name) = non_empty(Some(item.name.as_str())) else {
                continue;
            };
            let count = item.count.unwrap_or(1);
            items
                .entry(name)
                .and_modify(|existing: &mut InventoryItem| existing.count += count)
                .or_insert_with(|| InventoryItem {
                    description: item.description.clone().unwrap_or_default(),
                    count,
                });
        }
        Inventory::new(items)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::raw::{RawDisplacement, RawItem, RawObstacleReading};

    fn character(name: &str, direction: &str, distance: f64) -> RawCharacter {
        RawCharacter {
            name: Some(name.to_string()),
            role: Some("merchant".to_string()),
            movement: Some("idle".to_string()),
            placement: RawPlacement {
                direction: Some(direction.to_string()),
                distance: Some(distance),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_obstacles_band_and_default_unknown() {
        let raw = RawSensorBundle {
            obstacles: vec![
                RawObstacleReading {
                    heading: "north".to_string(),
                    signal: Some(RawSignal::Strength(0.9)),
                },
                RawObstacleReading {
                    heading: "e".to_string(),
                    signal: Some(RawSignal::Label("weak".to_string())),
                },
                RawObstacleReading {
                    heading: "south".to_string(),
                    signal: None,
                },
            ],
            ..Default::default()
        };

        let snapshot = PerceptionIngestor::default().ingest(1, &raw);
        assert_eq!(snapshot.signal(Heading::North), SignalLevel::Intense);
        assert_eq!(snapshot.signal(Heading::East), SignalLevel::Weak);
        assert_eq!(snapshot.signal(Heading::South), SignalLevel::Unknown);
        assert_eq!(snapshot.signal(Heading::West), SignalLevel::Unknown);
        assert_eq!(snapshot.blocked_headings(), vec![Heading::North]);
    }

    #[test]
    fn test_duplicate_sector_keeps_more_obstructed() {
        let raw = RawSensorBundle {
            obstacles: vec![
                RawObstacleReading {
                    heading: "west".to_string(),
                    signal: Some(RawSignal::Label("intense".to_string())),
                },
                RawObstacleReading {
                    heading: "W".to_string(),
                    signal: Some(RawSignal::Strength(0.1)),
                },
            ],
            ..Default::default()
        };
        let snapshot = PerceptionIngestor::default().ingest(1, &raw);
        assert_eq!(snapshot.signal(Heading::West), SignalLevel::Intense);
    }

    #[test]
    fn test_entities_are_banded_and_unnamed_dropped() {
        let mut unnamed = character("", "north", 3.0);
        unnamed.name = None;
        let raw = RawSensorBundle {
            characters: vec![character("Quinn", "east", 55.0), unnamed],
            ..Default::default()
        };

        let snapshot = PerceptionIngestor::default().ingest(2, &raw);
        assert_eq!(snapshot.entities().len(), 1);
        let quinn = &snapshot.entities()[0];
        assert_eq!(quinn.bearing.distance, DistanceBand::Far);
        assert_eq!(quinn.bearing.direction, Some(Heading::East));
        assert_eq!(quinn.movement, MovementState::Stationary);
        assert!(snapshot.is_observable("quinn"));
    }

    #[test]
    fn test_odometry_uses_latest_record() {
        let raw = RawSensorBundle {
            displacement: vec![
                RawDisplacement {
                    heading: Some("west".to_string()),
                    distance: Some(30.0),
                },
                RawDisplacement {
                    heading: Some("north".to_string()),
                    distance: Some(4.0),
                },
            ],
            ..Default::default()
        };

        let snapshot = PerceptionIngestor::default().ingest(3, &raw);
        let odometry = snapshot.odometry().unwrap();
        assert_eq!(odometry.heading, Some(Heading::North));
        assert_eq!(odometry.magnitude, MagnitudeBand::Short);
        assert_eq!(snapshot.backtrack_heading(), Some(Heading::South));
    }

    #[test]
    fn test_fingerprint_ignores_sequence() {
        let raw = RawSensorBundle {
            characters: vec![character("Quinn", "east", 5.0)],
            inventory: vec![RawItem {
                name: "Pickaxe".to_string(),
                description: None,
                count: None,
            }],
            ..Default::default()
        };
        let ingestor = PerceptionIngestor::default();
        let a = ingestor.ingest(1, &raw);
        let b = ingestor.ingest(9, &raw);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut moved = raw.clone();
        moved.characters[0].placement.distance = Some(50.0);
        let c = ingestor.ingest(10, &moved);
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert!(a.inventory().holds("pickaxe"));
    }
}
