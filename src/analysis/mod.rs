//! Graph-theoretic analysis: separation testing and the diagnostics channel.

pub mod report;
pub mod separation;

pub use report::{IdentificationEvent, IdentificationReport, InstrumentRejection};
pub use separation::SeparationOracle;
