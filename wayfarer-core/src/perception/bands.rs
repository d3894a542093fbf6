//! Qualitative vocabularies that replace raw numbers downstream of ingestion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{OdometryThresholds, PerceptionConfig, SignalThresholds};
use crate::error::WayfarerError;

/// One of eight compass sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Heading {
    /// All sectors, clockwise from north.
    pub const ALL: [Heading; 8] = [
        Heading::North,
        Heading::NorthEast,
        Heading::East,
        Heading::SouthEast,
        Heading::South,
        Heading::SouthWest,
        Heading::West,
        Heading::NorthWest,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::NorthEast => "northeast",
            Self::East => "east",
            Self::SouthEast => "southeast",
            Self::South => "south",
            Self::SouthWest => "southwest",
            Self::West => "west",
            Self::NorthWest => "northwest",
        }
    }

    /// Bearing of the sector centre in degrees (north = 0, clockwise).
    pub fn degrees(&self) -> f64 {
        self.index() as f64 * 45.0
    }

    /// Nearest sector for a bearing in degrees.
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !degrees.is_finite() {
            return None;
        }
        let normalized = degrees.rem_euclid(360.0);
        let idx = ((normalized / 45.0).round() as usize) % 8;
        Some(Self::ALL[idx])
    }

    /// Parse a compass word, abbreviation or numeric bearing.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        let heading = match key.as_str() {
            "n" | "north" => Self::North,
            "ne" | "northeast" => Self::NorthEast,
            "e" | "east" => Self::East,
            "se" | "southeast" => Self::SouthEast,
            "s" | "south" => Self::South,
            "sw" | "southwest" => Self::SouthWest,
            "w" | "west" => Self::West,
            "nw" | "northwest" => Self::NorthWest,
            other => {
                let digits = other.trim_end_matches("deg").trim_end_matches('°');
                return digits.parse::<f64>().ok().and_then(Self::from_degrees);
            }
        };
        Some(heading)
    }

    /// Sector rotated clockwise by `steps` of 45 degrees (negative = counter-clockwise).
    pub fn rotate(self, steps: i32) -> Self {
        let idx = (self.index() as i32 + steps).rem_euclid(8) as usize;
        Self::ALL[idx]
    }

    /// The sector pointing the other way.
    pub fn opposite(self) -> Self {
        self.rotate(4)
    }

    /// Number of 45-degree steps between two sectors (0..=4).
    pub fn steps_to(self, other: Heading) -> u8 {
        let diff = (self.index() as i32 - other.index() as i32).rem_euclid(8);
        diff.min(8 - diff) as u8
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Heading {
    type Err = WayfarerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| WayfarerError::SensorGap(format!("unknown heading '{}'", s)))
    }
}

/// Obstacle signal level for one heading sector.
///
/// Ordered weak < moderate < strong < intense. `Unknown` sits outside that
/// order: passable but unverified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SignalLevel {
    #[default]
    Unknown,
    Weak,
    Moderate,
    Strong,
    Intense,
}

impl SignalLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
            Self::Intense => "intense",
        }
    }

    /// Classify a raw strength on the `[0, 1]` scale.
    pub fn from_strength(strength: f64, thresholds: &SignalThresholds) -> Self {
        if !strength.is_finite() || !(0.0..=1.0).contains(&strength) {
            return Self::Unknown;
        }
        if strength >= thresholds.intense {
            Self::Intense
        } else if strength >= thresholds.strong {
            Self::Strong
        } else if strength >= thresholds.moderate {
            Self::Moderate
        } else {
            Self::Weak
        }
    }

    /// Classify a textual label. Unrecognized labels are `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "weak" | "low" | "clear" => Self::Weak,
            "moderate" | "medium" => Self::Moderate,
            "strong" | "high" => Self::Strong,
            "intense" | "blocked" | "impassable" => Self::Intense,
            _ => Self::Unknown,
        }
    }

    /// Impassable sector.
    pub fn is_intense(&self) -> bool {
        matches!(self, Self::Intense)
    }

    /// Ordering key used when choosing among open headings; unknown ranks as moderate.
    pub fn obstruction_rank(&self) -> u8 {
        match self {
            Self::Weak => 0,
            Self::Moderate | Self::Unknown => 1,
            Self::Strong => 2,
            Self::Intense => 3,
        }
    }
}

impl fmt::Display for SignalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Qualitative range bucket. `Near` is the interaction band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceBand {
    Near,
    Mid,
    Far,
    Distant,
    #[default]
    Unknown,
}

impl DistanceBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Near => "near",
            Self::Mid => "mid",
            Self::Far => "far",
            Self::Distant => "distant",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_distance(distance: f64, config: &PerceptionConfig) -> Self {
        if !distance.is_finite() || distance < 0.0 {
            Self::Unknown
        } else if distance <= config.near_distance {
            Self::Near
        } else if distance <= config.mid_distance {
            Self::Mid
        } else if distance <= config.far_distance {
            Self::Far
        } else {
            Self::Distant
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "near" | "close" | "adjacent" => Self::Near,
            "mid" | "medium" | "nearby" => Self::Mid,
            "far" => Self::Far,
            "distant" | "very far" => Self::Distant,
            _ => Self::Unknown,
        }
    }

    /// Within short-range interaction reach.
    pub fn is_interaction_range(&self) -> bool {
        matches!(self, Self::Near)
    }

    /// Near or mid: part of the local slice handed to the junior reflection tier.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Near | Self::Mid)
    }
}

impl fmt::Display for DistanceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relative height bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ElevationBand {
    Below,
    Level,
    Above,
    #[default]
    Unknown,
}

impl ElevationBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Below => "below",
            Self::Level => "level",
            Self::Above => "above",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_delta(delta: f64, tolerance: f64) -> Self {
        if !delta.is_finite() {
            Self::Unknown
        } else if delta > tolerance {
            Self::Above
        } else if delta < -tolerance {
            Self::Below
        } else {
            Self::Level
        }
    }
}

impl fmt::Display for ElevationBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How far the agent moved since the previous displacement record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MagnitudeBand {
    Still,
    Short,
    Medium,
    Long,
    #[default]
    Unknown,
}

impl MagnitudeBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Still => "still",
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_magnitude(magnitude: f64, thresholds: &OdometryThresholds) -> Self {
        if !magnitude.is_finite() || magnitude < 0.0 {
            Self::Unknown
        } else if magnitude <= thresholds.still {
            Self::Still
        } else if magnitude <= thresholds.short {
            Self::Short
        } else if magnitude <= thresholds.medium {
            Self::Medium
        } else {
            Self::Long
        }
    }
}

impl fmt::Display for MagnitudeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_parse_variants() {
        assert_eq!(Heading::parse("North"), Some(Heading::North));
        assert_eq!(Heading::parse("ne"), Some(Heading::NorthEast));
        assert_eq!(Heading::parse("south-west"), Some(Heading::SouthWest));
        assert_eq!(Heading::parse("north_west"), Some(Heading::NorthWest));
        assert_eq!(Heading::parse("90"), Some(Heading::East));
        assert_eq!(Heading::parse("350deg"), Some(Heading::North));
        assert_eq!(Heading::parse("upward"), None);
    }

    #[test]
    fn test_heading_geometry() {
        assert_eq!(Heading::North.opposite(), Heading::South);
        assert_eq!(Heading::NorthWest.rotate(1), Heading::North);
        assert_eq!(Heading::North.rotate(-1), Heading::NorthWest);
        assert_eq!(Heading::North.steps_to(Heading::South), 4);
        assert_eq!(Heading::North.steps_to(Heading::West), 2);
        assert_eq!(Heading::East.steps_to(Heading::NorthEast), 1);
    }

    #[test]
    fn test_signal_from_strength() {
        let t = SignalThresholds::default();
        assert_eq!(SignalLevel::from_strength(0.1, &t), SignalLevel::Weak);
        assert_eq!(SignalLevel::from_strength(0.25, &t), SignalLevel::Moderate);
        assert_eq!(SignalLevel::from_strength(0.6, &t), SignalLevel::Strong);
        assert_eq!(SignalLevel::from_strength(0.9, &t), SignalLevel::Intense);
        assert_eq!(SignalLevel::from_strength(1.7, &t), SignalLevel::Unknown);
        assert_eq!(SignalLevel::from_strength(f64::NAN, &t), SignalLevel::Unknown);
    }

    #[test]
    fn test_signal_labels_never_guess_intense() {
        assert_eq!(SignalLevel::from_label("INTENSE"), SignalLevel::Intense);
        assert_eq!(SignalLevel::from_label("medium"), SignalLevel::Moderate);
        assert_eq!(SignalLevel::from_label("???"), SignalLevel::Unknown);
        assert!(!SignalLevel::Unknown.is_intense());
    }

    #[test]
    fn test_distance_bands() {
        let config = PerceptionConfig::default();
        assert_eq!(DistanceBand::from_distance(10.0, &config), DistanceBand::Near);
        assert_eq!(DistanceBand::from_distance(10.5, &config), DistanceBand::Mid);
        assert_eq!(DistanceBand::from_distance(50.0, &config), DistanceBand::Far);
        assert_eq!(DistanceBand::from_distance(500.0, &config), DistanceBand::Distant);
        assert_eq!(DistanceBand::from_distance(-1.0, &config), DistanceBand::Unknown);
        assert!(DistanceBand::Near.is_interaction_range());
        assert!(!DistanceBand::Mid.is_interaction_range());
    }

    #[test]
    fn test_elevation_bands() {
        assert_eq!(ElevationBand::from_delta(3.0, 2.0), ElevationBand::Above);
        assert_eq!(ElevationBand::from_delta(-2.5, 2.0), ElevationBand::Below);
        assert_eq!(ElevationBand::from_delta(1.0, 2.0), ElevationBand::Level);
    }
}
