//! Bounded memory: goals, plans, reflections, action log, navigation points.

mod bundle;
mod entries;
mod goals;
mod store;


pub use bundle::{BUNDLE_VERSION, MemoryBundle};
pub use entries::{ActionLogEntry, NavigationPoint, Outcome, Reflection};
pub use goals::{GOAL_CAP, Goal, PLAN_CAP, PlanStep, Priority, Truncation};
pub(crate) use goals::{merge_goals, normalize_plans};
pub use store::MemoryStore;
