//! Heading choice around blocked sectors.

use crate::perception::{Heading, PerceptionSnapshot};

/// Nearest open heading to `desired` when `desired` itself reads intense.
///
/// Sectors are tried at ±45°, ±90°, ±135°, closest first; within one ring the
/// lower obstruction wins and clockwise wins a remaining tie. Intense sectors
/// and the backtrack heading are skipped. The backtrack heading is returned
/// only when nothing else is open.
pub fn alternate_heading(snapshot: &PerceptionSnapshot, desired: Heading) -> Option<Heading> {
    let backtrack = snapshot.backtrack_heading();
    let open = |h: &Heading| !snapshot.signal(*h).is_intense();

    for step in 1..=3 {
        let ring = [desired.rotate(step), desired.rotate(-step)];
        let best = ring
            .into_iter()
            .filter(open)
            .filter(|h| Some(*h) != backtrack)
            .min_by_key(|h| snapshot.signal(*h).obstruction_rank());
        if best.is_some() {
            return best;
        }
    }

    backtrack.filter(open)
}

/// Least obstructed open heading other than the backtrack heading, for
/// exploration. Ties go to the heading of the last displacement, then
/// clockwise from north.
pub fn explore_heading(snapshot: &PerceptionSnapshot) -> Option<Heading> {
    let backtrack = snapshot.backtrack_heading();
    let forward = snapshot.odometry().and_then(|o| o.heading);

    Heading::ALL
        .iter()
        .copied()
        .filter(|h| !snapshot.signal(*h).is_intense() && Some(*h) != backtrack)
        .min_by_key(|h| (snapshot.signal(*h).obstruction_rank(), Some(*h) != forward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{
        PerceptionIngestor, RawDisplacement, RawObstacleReading, RawSensorBundle, RawSignal,
    };

    fn snapshot(readings: &[(&str, &str)], moved: Option<&str>) -> PerceptionSnapshot {
        let raw = RawSensorBundle {
            obstacles: readings
                .iter()
                .map(|(h, l)| RawObstacleReading {
                    heading: h.to_string(),
                    signal: Some(RawSignal::Label(l.to_string())),
                })
                .collect(),
            displacement: moved
                .map(|h| {
                    vec![RawDisplacement {
                        heading: Some(h.to_string()),
                        distance: Some(8.0),
                    }]
                })
                .unwrap_or_default(),
            ..Default::default()
        };
        PerceptionIngestor::default().ingest(1, &raw)
    }

    #[test]
    fn test_prefers_nearest_ring_with_lower_signal() {
        let snap = snapshot(
            &[("north", "intense"), ("northeast", "strong"), ("northwest", "weak")],
            None,
        );
        assert_eq!(alternate_heading(&snap, Heading::North), Some(Heading::NorthWest));
    }

    #[test]
    fn test_unknown_ranks_as_moderate() {
        // northwest unknown, northeast moderate: tie, clockwise wins
        let snap = snapshot(&[("north", "intense"), ("northeast", "moderate")], None);
        assert_eq!(alternate_heading(&snap, Heading::North), Some(Heading::NorthEast));

        let snap = snapshot(&[("north", "intense"), ("northeast", "strong")], None);
        assert_eq!(alternate_heading(&snap, Heading::North), Some(Heading::NorthWest));
    }

    #[test]
    fn test_skips_backtrack_until_last_resort() {
        // Arrived moving north-east; backtrack is south-west.
        let mut readings = vec![("north", "intense")];
        for h in ["northeast", "northwest", "east", "west", "southeast"] {
            readings.push((h, "intense"));
        }
        let snap = snapshot(&readings, Some("northeast"));
        assert_eq!(alternate_heading(&snap, Heading::North), Some(Heading::SouthWest));

        readings.push(("southwest", "intense"));
        let snap = snapshot(&readings, Some("northeast"));
        assert_eq!(alternate_heading(&snap, Heading::North), None);
    }

    #[test]
    fn test_backtrack_skipped_when_alternatives_exist() {
        let snap = snapshot(
            &[("east", "intense"), ("northeast", "intense"), ("southeast", "weak")],
            Some("south"),
        );
        // backtrack = north; southeast is the first open ring member
        assert_eq!(alternate_heading(&snap, Heading::East), Some(Heading::SouthEast));
    }

    #[test]
    fn test_explore_heading() {
        let snap = snapshot(&[("north", "weak"), ("south", "weak")], Some("south"));
        // backtrack = north, so south is the only weak open heading
        assert_eq!(explore_heading(&snap), Some(Heading::South));

        let all_blocked: Vec<_> = Heading::ALL.iter().map(|h| (h.as_str(), "intense")).collect();
        assert_eq!(explore_heading(&snapshot(&all_blocked, None)), None);
    }
}
