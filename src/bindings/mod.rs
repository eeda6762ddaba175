//! FFI layer. Only compiled for the Python extension build.
pub mod python;

pub use python::{PyCausalModel, PyIdentifiedEstimand};
