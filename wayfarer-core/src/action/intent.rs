//! Turning a plan step or goal into a concrete candidate action.

use super::invocation::ActionInvocation;
use super::space::{ActionSpace, ParameterKind, PreconditionClass};
use crate::memory::MemoryStore;
use crate::perception::{Heading, PerceptionSnapshot};

const TALK_VERBS: &[&str] = &["talk", "speak", "ask", "greet", "chat"];
const COLLECT_VERBS: &[&str] = &[
    "collect", "gather", "pick", "take", "harvest", "mine", "chop", "grab",
];
const MOVE_VERBS: &[&str] = &[
    "go", "reach", "move", "approach", "find", "walk", "head", "travel", "follow",
];
const NAVIGATE_VERBS: &[&str] = &["navigate", "return"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Talk,
    Collect,
    Move,
    Navigate,
}

fn classify_verb(words: &[String]) -> Option<Verb> {
    words.iter().find_map(|w| {
        let w = w.as_str();
        if TALK_VERBS.contains(&w) {
            Some(Verb::Talk)
        } else if COLLECT_VERBS.contains(&w) {
            Some(Verb::Collect)
        } else if NAVIGATE_VERBS.contains(&w) {
            Some(Verb::Navigate)
        } else if MOVE_VERBS.contains(&w) {
            Some(Verb::Move)
        } else {
            None
        }
    })
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `name` occurs in `text` on word boundaries, case-insensitively.
pub(crate) fn mentions(text: &str, name: &str) -> bool {
    let hay = words(text);
    let needle = words(name);
    !needle.is_empty() && hay.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Compass heading named in the text, compound names first.
fn mentioned_heading(text: &str) -> Option<Heading> {
    let hay = words(text);
    let compounds = [
        (["north", "east"], Heading::NorthEast),
        (["north", "west"], Heading::NorthWest),
        (["south", "east"], Heading::SouthEast),
        (["south", "west"], Heading::SouthWest),
    ];
    for (pair, heading) in compounds {
        if hay.windows(2).any(|w| w[0] == pair[0] && w[1] == pair[1]) {
            return Some(heading);
        }
    }
    hay.iter()
        .filter(|w| w.len() >= 4 && w.chars().all(char::is_alphabetic))
        .find_map(|w| Heading::parse(w))
}

/// The observable whose name appears in the text; the longest name wins.
fn mentioned_target<'a>(text: &str, snapshot: &'a PerceptionSnapshot) -> Option<&'a str> {
    snapshot
        .observables()
        .into_iter()
        .filter(|o| mentions(text, o.name))
        .max_by_key(|o| o.name.len())
        .map(|o| o.name)
}

/// The text the plan-derived candidate is computed from: the current plan
/// step, or with no plan the top goal.
pub fn intent_text(memory: &MemoryStore) -> Option<String> {
    memory
        .plans()
        .first()
        .map(|s| s.text().to_string())
        .or_else(|| memory.top_goal().map(|g| g.text.clone()))
}

/// Map intent text onto an action of the current action space.
///
/// Returns `None` when the text names nothing actionable or the matching
/// action class is absent.
pub fn derive_candidate(
    text: &str,
    snapshot: &PerceptionSnapshot,
    memory: &MemoryStore,
    space: &ActionSpace,
) -> Option<ActionInvocation> {
    let tokens = words(text);
    let verb = classify_verb(&tokens);
    let target = mentioned_target(text, snapshot);
    let point = memory
        .navigation_points()
        .iter()
        .find(|p| mentions(text, &p.name))
        .map(|p| p.name.as_str());

    let by_class = |class: PreconditionClass, kind: ParameterKind, value: &str| {
        space.first_of(class)?.invoke_with(kind, value)
    };

    match (verb, target, point) {
        (Some(Verb::Talk), Some(t), _) => by_class(PreconditionClass::Talk, ParameterKind::Target, t),
        (Some(Verb::Collect), Some(t), _) => {
            by_class(PreconditionClass::Collect, ParameterKind::Target, t)
        }
        (Some(Verb::Navigate), _, Some(p)) => {
            by_class(PreconditionClass::Navigate, ParameterKind::Point, p)
        }
        (Some(Verb::Move) | None, Some(t), _) => {
            by_class(PreconditionClass::MoveToTarget, ParameterKind::Target, t)
        }
        (Some(Verb::Move), None, Some(p)) => {
            by_class(PreconditionClass::Navigate, ParameterKind::Point, p)
        }
        _ => {
            let heading = mentioned_heading(text)?;
            by_class(
                PreconditionClass::MoveInDirection,
                ParameterKind::Direction,
                heading.as_str(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::NavigationPoint;
    use crate::perception::{PerceptionIngestor, RawCharacter, RawPlacement, RawSensorBundle};

    fn world() -> PerceptionSnapshot {
        let raw = RawSensorBundle {
            characters: vec![RawCharacter {
                name: Some("Quinn".to_string()),
                placement: RawPlacement {
                    direction: Some("east".to_string()),
                    distance: Some(50.0),
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..Default::default()
        };
        PerceptionIngestor::default().ingest(1, &raw)
    }

    fn derive(text: &str, memory: &MemoryStore) -> Option<ActionInvocation> {
        derive_candidate(text, &world(), memory, &ActionSpace::standard())
    }

    #[test]
    fn test_verbs_map_to_classes() {
        let memory = MemoryStore::default();
        assert_eq!(derive("Talk to Quinn", &memory).unwrap().name, "talk_to");
        assert_eq!(derive("Reach Quinn", &memory).unwrap().name, "move_to_target");
        assert_eq!(derive("quinn", &memory).unwrap().name, "move_to_target");
        assert!(derive("Collect berries", &memory).is_none());
    }

    #[test]
    fn test_compass_words() {
        let memory = MemoryStore::default();
        let inv = derive("Head north-east along the ridge", &memory).unwrap();
        assert_eq!(inv.name, "move_in_direction");
        assert_eq!(inv.heading(), Some(Heading::NorthEast));

        // "sew" must not be read as a heading abbreviation
        assert!(derive("sew a sail", &memory).is_none());
    }

    #[test]
    fn test_navigation_points() {
        let mut memory = MemoryStore::default();
        memory.add_navigation_point(NavigationPoint::new("Old Mill"));
        let inv = derive("Return to the old mill", &memory).unwrap();
        assert_eq!(inv.name, "navigate_to");
        assert_eq!(inv.argument_str("point"), Some("Old Mill"));

        let inv = derive("go to old mill", &memory).unwrap();
        assert_eq!(inv.name, "navigate_to");
    }

    #[test]
    fn test_mentions_uses_word_boundaries() {
        assert!(mentions("talk to Quinn now", "quinn"));
        assert!(!mentions("talk to Quinnley", "quinn"));
        assert!(mentions("visit the Old Mill", "old mill"));
    }
}
