//! Perception ingestion
//!
//! Turns raw, heterogeneous sensor feeds into one immutable
//! [`PerceptionSnapshot`] per cycle. Only qualitative vocabularies leave this
//! module: distance, elevation and magnitude bands, and the four obstacle
//! signal levels (plus `unknown` for gaps).

mod bands;
mod ingest;
mod raw;
mod snapshot;
mod summary;

pub use bands::{DistanceBand, ElevationBand, Heading, MagnitudeBand, SignalLevel};
pub use ingest::PerceptionIngestor;
pub use raw::{
    RawCharacter, RawDisplacement, RawFeature, RawItem, RawNavigationPoint, RawObstacleReading,
    RawPlacement, RawSensorBundle, RawSignal,
};
pub use snapshot::{
    Bearing, Entity, Inventory, InventoryItem, MovementState, Observed, ObservedKind,
    ObservedObject, OdometryDelta, PerceptionSnapshot, Structure, TerrainFeature,
};
pub use summary::{PerceptionSections, PerceptionSummary, split_sections};
