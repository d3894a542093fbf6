//! Text rendering of a snapshot for oracle prompts, and splitting of an
//! oracle-written perception summary into its two sections.

use serde::{Deserialize, Serialize};

use super::snapshot::PerceptionSnapshot;

const EMPTY: &str = "    N/A";

/// Per-category text blocks describing a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionSummary {
    pub location: String,
    pub weather: String,
    pub terrain: String,
    pub structures: String,
    pub characters: String,
    pub objects: String,
    pub obstacles: String,
    pub odometry: String,
}

impl PerceptionSummary {
    pub fn render(snapshot: &PerceptionSnapshot) -> Self {
        let location = snapshot
            .position()
            .map(|p| format!("    - {}", p))
            .unwrap_or_else(|| EMPTY.to_string());

        let weather = block(snapshot.weather().iter().cloned());

        let terrain = block(
            snapshot
                .terrain()
                .iter()
                .map(|t| format!("{}, {}", t.description, t.bearing.describe())),
        );

        let structures = block(snapshot.structures().iter().map(|s| {
            with_detail(
                format!("{}, {}", s.name, s.bearing.describe()),
                &s.description,
            )
        }));

        let characters = block(snapshot.entities().iter().map(|e| {
            format!(
                "{} ({}, {}), {}",
                e.name,
                e.role,
                movement_label(e),
                e.bearing.describe()
            )
        }));

        let objects = block(snapshot.objects().iter().map(|o| {
            with_detail(
                format!("{}, {}", o.name, o.bearing.describe()),
                &o.description,
            )
        }));

        let obstacles = block(
            snapshot
                .obstacle_readings()
                .into_iter()
                .map(|(heading, level)| format!("{}: {}", heading, level)),
        );

        let odometry = snapshot
            .odometry()
            .map(|o| {
                let heading = o.heading.map(|h| h.as_str()).unwrap_or("unknown heading");
                format!("    - {}, {}", heading, o.magnitude)
            })
            .unwrap_or_else(|| EMPTY.to_string());

        Self {
            location,
            weather,
            terrain,
            structures,
            characters,
            objects,
            obstacles,
            odometry,
        }
    }

    /// All sections under markdown headers.
    pub fn to_prompt_text(&self) -> String {
        format!(
            "## Location\n{}\n## Weather\n{}\n## Terrain\n{}\n## Structures\n{}\n## Characters\n{}\n## Objects\n{}\n## Obstacle signals\n{}\n## Last movement\n{}\n",
            self.location,
            self.weather,
            self.terrain,
            self.structures,
            self.characters,
            self.objects,
            self.obstacles,
            self.odometry
        )
    }
}

fn movement_label(entity: &super::snapshot::Entity) -> &'static str {
    use super::snapshot::MovementState;
    match entity.movement {
        MovementState::Stationary => "stationary",
        MovementState::Moving => "moving",
        MovementState::Approaching => "approaching",
        MovementState::Departing => "departing",
        MovementState::Unknown => "movement unknown",
    }
}

fn with_detail(line: String, detail: &str) -> String {
    if detail.trim().is_empty() {
        line
    } else {
        format!("{}\n      {}", line, detail.trim())
    }
}

fn block(lines: impl Iterator<Item = String>) -> String {
    let rendered: Vec<String> = lines.map(|l| format!("    - {}", l)).collect();
    if rendered.is_empty() {
        EMPTY.to_string()
    } else {
        rendered.join("\n")
    }
}

/// Environment and object sections of a free-text perception summary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerceptionSections {
    pub environment: String,
    pub objects: String,
}

/// Split a summary into environment and objects using markdown headers.
///
/// No header: first line is environment, the rest objects. One header: it
/// starts the objects section. Two or more: the second header starts the
/// objects section. Header lines are dropped from both sections.
pub fn split_sections(content: &str) -> PerceptionSections {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let headers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with('#'))
        .map(|(i, _)| i)
        .collect();

    let (environment, objects): (&[&str], &[&str]) = match headers.as_slice() {
        [] if lines.is_empty() => (&[], &[]),
        [] => (&lines[..1], &lines[1..]),
        [only] => (&lines[..*only], &lines[*only + 1..]),
        [_, second, ..] => (&lines[..*second], &lines[*second + 1..]),
    };

    let join = |section: &[&str]| {
        section
            .iter()
            .filter(|l| !l.starts_with('#'))
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    };

    PerceptionSections {
        environment: join(environment),
        objects: join(objects),
    }
}
