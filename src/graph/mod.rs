//! Defines the core data structures for the causal graph.
pub mod builder;
pub mod edge;
pub mod error;
pub mod model;
pub mod variable;

// Re-export key types for convenient access
pub use builder::CausalGraphBuilder;
pub use edge::EdgeKind;
pub use error::StructuralError;
pub use model::CausalGraph;
pub use variable::{NodeId, Variable, VariableRole};
