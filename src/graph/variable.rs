//! Defines the `Variable` payload and its role vocabulary, representing a
//! single named quantity in the causal model.

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a variable within the graph.
///
/// This is a type alias for `petgraph::graph::NodeIndex` to abstract the
/// underlying graph implementation.
pub type NodeId = NodeIndex;

/// The causal role a variable plays relative to a treatment/outcome pair.
///
/// Roles are informative rather than load-bearing: when an explicit graph is
/// supplied, the engine re-derives common causes, instruments and effect
/// modifiers from structure and ignores stale tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VariableRole {
    /// The intervened-upon variable.
    Treatment,
    /// The variable whose response to treatment is of interest.
    Outcome,
    /// An ancestor of both treatment and outcome.
    CommonCause,
    /// An ancestor of treatment with no open route to outcome except through treatment.
    Instrument,
    /// A variable that modulates the strength of the effect without causing treatment.
    EffectModifier,
    /// An unmeasured common cause.
    UnobservedConfounder,
    /// A measured variable with no special role.
    ObservedOther,
}

/// A node in the causal graph: a named variable, its observability, and any
/// role tags attached at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Whether the variable appears in the dataset handed to the estimator.
    pub observed: bool,
    /// Role tags. Usually one; combinations are only legal when one of the
    /// roles is `Treatment` or `Outcome`.
    pub roles: Vec<VariableRole>,
}

impl Variable {
    /// An observed variable with no role tag yet.
    pub fn observed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observed: true,
            roles: Vec::new(),
        }
    }

    /// An unmeasured variable. These can never appear in an adjustment set.
    pub fn unobserved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observed: false,
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: VariableRole) -> Self {
        self.add_role(role);
        self
    }

    pub fn has_role(&self, role: VariableRole) -> bool {
        self.roles.contains(&role)
    }

    pub(crate) fn add_role(&mut self, role: VariableRole) {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        if role == VariableRole::UnobservedConfounder {
            self.observed = false;
        }
    }
}
