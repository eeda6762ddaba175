//! Defines the error types for the identification module.

use super::estimand::IdentifierMethod;
use thiserror::Error;

/// Failures at the `identify_effect` boundary or at method selection time.
/// An unidentifiable effect is *not* an error; it is reported through the
/// estimand's empty slots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentificationError {
    #[error("unsupported estimand type '{0}'; only 'nonparametric-ate' is supported")]
    UnsupportedEstimandType(String),
    #[error("unknown identifier method '{0}'")]
    UnknownMethod(String),
    #[error("method '{0}' did not identify the effect and cannot be selected")]
    MethodNotIdentified(IdentifierMethod),
}
