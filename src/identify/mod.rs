//! The identification engine: backdoor, instrumental-variable and front-door
//! searches over a causal graph, producing an `IdentifiedEstimand`.

mod backdoor;
mod frontdoor;
mod instrument;
mod subsets;

pub mod engine;
pub mod error;
pub mod estimand;

pub use engine::{IdentificationConfig, IdentificationEngine};
pub use error::IdentificationError;
pub use estimand::{Estimand, EstimandType, IdentifiedEstimand, IdentifierMethod};

use crate::analysis::report::IdentificationEvent;

/// What one identification attempt produced: the estimand (if the method
/// identified the effect) and the events it wants on the report. Each attempt
/// owns its event list so the attempts can run in parallel without sharing
/// mutable state.
pub(crate) struct MethodOutcome {
    pub estimand: Option<Estimand>,
    pub events: Vec<IdentificationEvent>,
}
