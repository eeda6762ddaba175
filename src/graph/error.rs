//! Defines the error types for graph construction and structural queries.

use thiserror::Error;

/// A structural defect in the supplied model. All variants are fatal and
/// abort construction eagerly; identifiability failure is never reported
/// through this type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("unknown variable '{0}'")]
    UnknownNode(String),
    #[error("duplicate variable name '{0}'")]
    DuplicateNode(String),
    #[error("self-loop on variable '{0}'")]
    SelfLoop(String),
    #[error("cycle in the directed subgraph involving '{0}'")]
    CycleDetected(String),
    #[error("conflicting roles for variable '{0}'")]
    ConflictingRoles(String),
    #[error(
        "model declares no common causes and no instruments; \
         confirmation that no hidden confounders exist was not given"
    )]
    UnconfirmedNoConfounders,
}
