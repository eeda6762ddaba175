//! Core engine for the `compass` causal-inference library.
//!
//! Formalizes causal assumptions as a directed graph with latent-confounding
//! links, and decides via graph-theoretic criteria whether the effect of a
//! treatment on an outcome can be expressed over observables. The output is
//! a symbolic estimand per identification method, or an empty slot where a
//! method fails. Numeric estimation, refutation and rendering live in the
//! Python layer on top.

pub mod analysis;
pub mod graph;
pub mod identify;

#[cfg(feature = "extension-module")]
pub mod bindings;

pub use analysis::{IdentificationEvent, IdentificationReport, SeparationOracle};
pub use graph::{
    CausalGraph, CausalGraphBuilder, EdgeKind, NodeId, StructuralError, Variable, VariableRole,
};
pub use identify::{
    Estimand, EstimandType, IdentificationConfig, IdentificationEngine, IdentificationError,
    IdentifiedEstimand, IdentifierMethod,
};

// --- Python Module Definition ---
// This defines the `compass._core` module. The name `_core` is chosen to
// indicate it's an internal, compiled component.
#[cfg(feature = "extension-module")]
mod pymodule {
    use pyo3::prelude::*;

    /// A simple function to confirm the Rust core is callable from Python.
    #[pyfunction]
    fn rust_core_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    #[pymodule]
    fn _core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(rust_core_version, m)?)?;
        m.add_class::<crate::bindings::PyCausalModel>()?;
        m.add_class::<crate::bindings::PyIdentifiedEstimand>()?;
        Ok(())
    }
}
