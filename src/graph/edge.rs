//! Defines the `EdgeKind` type, representing a causal link between two variables.

use serde::{Deserialize, Serialize};

/// Describes the semantic type of a link in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// A direct causal influence from source to target.
    /// Example: `Z -> T`. `Z` is a direct cause of `T`.
    Directed,
    /// Latent confounding between the two endpoints: an unmeasured common
    /// cause influences both. Stored once with arbitrary orientation and
    /// treated as symmetric by every traversal.
    Bidirected,
}
