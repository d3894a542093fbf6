//! Raw, heterogeneous sensor feeds as delivered by the environment.
//!
//! Every field is optional; gaps are resolved by the ingestor.

use serde::{Deserialize, Serialize};

use crate::action::ActionSpace;

/// Everything the environment hands over for one cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSensorBundle {
    /// Current position reference (location name or description)
    pub position: Option<String>,

    /// Obstacle signal per heading
    pub obstacles: Vec<RawObstacleReading>,

    /// Displacement history, oldest first
    pub displacement: Vec<RawDisplacement>,

    pub terrain: Vec<RawFeature>,
    pub structures: Vec<RawFeature>,
    pub characters: Vec<RawCharacter>,
    pub objects: Vec<RawFeature>,
    pub weather: Vec<String>,
    pub inventory: Vec<RawItem>,

    /// Navigation points known to the environment
    pub navigation_points: Vec<RawNavigationPoint>,

    /// Callable actions for this cycle
    pub action_space: ActionSpace,
}

/// Obstacle reading for one heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObstacleReading {
    pub heading: String,
    #[serde(default)]
    pub signal: Option<RawSignal>,
}

/// Signal strength as a number in `[0, 1]` or as a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSignal {
    Strength(f64),
    Label(String),
}

/// One displacement record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDisplacement {
    /// Compass word or bearing in degrees
    pub heading: Option<String>,
    pub distance: Option<f64>,
}

/// Where something is relative to the agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPlacement {
    pub direction: Option<String>,
    pub distance: Option<f64>,
    /// Pre-banded distance, used when no numeric distance is given
    pub distance_label: Option<String>,
    /// Height relative to the agent
    pub elevation: Option<f64>,
}

/// Terrain feature, structure or object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFeature {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub placement: RawPlacement,
}

/// Character (player, NPC or creature).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCharacter {
    pub name: Option<String>,
    pub role: Option<String>,
    pub movement: Option<String>,
    #[serde(flatten)]
    pub placement: RawPlacement,
}

/// Inventory line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawItem {
    pub name: String,
    pub description: Option<String>,
    pub count: Option<u32>,
}

/// Navigation point as reported by the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNavigationPoint {
    pub name: String,
    pub direction: Option<String>,
    pub distance: Option<f64>,
    pub note: Option<String>,
}
