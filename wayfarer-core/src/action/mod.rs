//! Action space, candidate derivation, precondition gating and outcome recording.

mod heading;
mod intent;
mod invocation;
mod recorder;
mod selector;
mod space;

pub use heading::{alternate_heading, explore_heading};
pub use intent::{derive_candidate, intent_text};
pub use invocation::ActionInvocation;
pub use recorder::{ActionLogRecorder, ActuatorReport};
pub use selector::{
    ActionSelector, Rejection, Selection, SelectionContext, SelectionSource, Substitution,
};
pub use space::{
    ActionDefinition, ActionSpace, ParameterKind, ParameterSpec, PreconditionClass,
};
