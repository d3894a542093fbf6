//! Reflection: a note on recent events plus revised goals and plans.
//!
//! Junior and senior are two [`TierProfile`]s of one [`ReflectionEngine`].
//! The junior tier sees the near/mid slice and the last few actions and only
//! writes a note; the senior tier sees everything and may rewrite goals and
//! plans.

mod engine;
mod mapping;
mod tier;


pub use engine::{ReflectionContext, ReflectionEngine, ReflectionOutcome};
pub use tier::{Tier, TierProfile};
