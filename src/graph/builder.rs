//! builder.rs
//! Assembles a `CausalGraph` from either an explicit edge list or declared
//! role sets, enforcing the structural invariants eagerly.

use super::edge::EdgeKind;
use super::error::StructuralError;
use super::model::CausalGraph;
use super::variable::{NodeId, Variable, VariableRole};
use crate::analysis::report::IdentificationEvent;
use petgraph::stable_graph::StableDiGraph;
use std::collections::{HashMap, HashSet};

/// Builder for a `CausalGraph`.
///
/// Two construction paths, mirroring what callers can actually supply:
///
/// * **Explicit**: `edge`/`bidirected`/`node` calls describe the structure;
///   common causes, instruments and effect modifiers are later *derived* from
///   it, never taken on faith.
/// * **Declared**: no edges given; `common_causes`/`instruments`/
///   `effect_modifiers` sets are layered onto the treatment/outcome names and
///   the canonical edges are synthesized.
///
/// If the declared path has neither common causes nor instruments, the model
/// is only buildable when the injected confirmation callback vouches for the
/// "no hidden confounders" assumption. The core never prompts anyone itself.
pub struct CausalGraphBuilder {
    treatments: Vec<String>,
    outcomes: Vec<String>,
    explicit_nodes: Vec<Variable>,
    edges: Vec<(String, String)>,
    bidirected: Vec<(String, String)>,
    roles: Vec<(String, VariableRole)>,
    unobserved: Vec<String>,
    common_causes: Vec<String>,
    instruments: Vec<String>,
    effect_modifiers: Vec<String>,
    observed_columns: Option<Vec<String>>,
    missing_nodes_as_confounders: bool,
    confirm_no_confounders: Option<Box<dyn Fn() -> bool>>,
}

impl CausalGraphBuilder {
    pub fn new<S: Into<String>>(
        treatments: impl IntoIterator<Item = S>,
        outcomes: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            treatments: treatments.into_iter().map(Into::into).collect(),
            outcomes: outcomes.into_iter().map(Into::into).collect(),
            explicit_nodes: Vec::new(),
            edges: Vec::new(),
            bidirected: Vec::new(),
            roles: Vec::new(),
            unobserved: Vec::new(),
            common_causes: Vec::new(),
            instruments: Vec::new(),
            effect_modifiers: Vec::new(),
            observed_columns: None,
            missing_nodes_as_confounders: false,
            confirm_no_confounders: None,
        }
    }

    /// Adds a fully specified node. Only needed when the observability flag or
    /// a role tag must be set up front; plain `edge` calls create observed
    /// nodes on demand.
    pub fn node(mut self, variable: Variable) -> Self {
        self.explicit_nodes.push(variable);
        self
    }

    /// Adds a directed edge `from -> to`, creating endpoints as needed.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Adds a latent-confounding link between `a` and `b`.
    pub fn bidirected(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.bidirected.push((a.into(), b.into()));
        self
    }

    /// Attaches a role annotation to an existing node.
    pub fn annotate(mut self, name: impl Into<String>, role: VariableRole) -> Self {
        self.roles.push((name.into(), role));
        self
    }

    /// Marks a node as unmeasured.
    pub fn mark_unobserved(mut self, name: impl Into<String>) -> Self {
        self.unobserved.push(name.into());
        self
    }

    pub fn common_causes<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.common_causes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn instruments<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.instruments.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn effect_modifiers<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.effect_modifiers.extend(names.into_iter().map(Into::into));
        self
    }

    /// The dataset column names. Nodes absent from this list are treated as
    /// unmeasured; combined with `missing_nodes_as_confounders`, columns
    /// absent from the graph become synthetic confounder nodes.
    pub fn observed_columns<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.observed_columns = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn missing_nodes_as_confounders(mut self, enabled: bool) -> Self {
        self.missing_nodes_as_confounders = enabled;
        self
    }

    /// Injects the yes/no gate consulted when a declared-role model carries
    /// neither common causes nor instruments.
    pub fn confirm_absent_confounders(mut self, gate: impl Fn() -> bool + 'static) -> Self {
        self.confirm_no_confounders = Some(Box::new(gate));
        self
    }

    pub fn build(self) -> Result<CausalGraph, StructuralError> {
        let mut events = Vec::new();
        let mut edges = self.edges;
        let mut roles = self.roles;

        let declared_path = edges.is_empty() && self.bidirected.is_empty();
        if declared_path {
            if self.common_causes.is_empty() && self.instruments.is_empty() {
                let confirmed = self
                    .confirm_no_confounders
                    .as_ref()
                    .map(|gate| gate())
                    .unwrap_or(false);
                if !confirmed {
                    return Err(StructuralError::UnconfirmedNoConfounders);
                }
                events.push(IdentificationEvent::AssumedNoUnobservedConfounders);
            }
            events.push(IdentificationEvent::GraphSynthesizedFromRoles);

            for cause in &self.common_causes {
                roles.push((cause.clone(), VariableRole::CommonCause));
                for t in &self.treatments {
                    edges.push((cause.clone(), t.clone()));
                }
                for y in &self.outcomes {
                    edges.push((cause.clone(), y.clone()));
                }
            }
            for instrument in &self.instruments {
                roles.push((instrument.clone(), VariableRole::Instrument));
                for t in &self.treatments {
                    edges.push((instrument.clone(), t.clone()));
                }
            }
            for modifier in &self.effect_modifiers {
                roles.push((modifier.clone(), VariableRole::EffectModifier));
                for y in &self.outcomes {
                    edges.push((modifier.clone(), y.clone()));
                }
            }
            for t in &self.treatments {
                for y in &self.outcomes {
                    edges.push((t.clone(), y.clone()));
                }
            }
        }

        let mut graph: StableDiGraph<Variable, EdgeKind> = StableDiGraph::new();
        let mut index: HashMap<String, NodeId> = HashMap::new();

        for variable in self.explicit_nodes {
            if index.contains_key(&variable.name) {
                return Err(StructuralError::DuplicateNode(variable.name));
            }
            let name = variable.name.clone();
            let id = graph.add_node(variable);
            index.insert(name, id);
        }

        let mut seen_edges: HashSet<(NodeId, NodeId, EdgeKind)> = HashSet::new();
        for (from, to) in edges {
            if from == to {
                return Err(StructuralError::SelfLoop(from));
            }
            let a = ensure_node(&mut graph, &mut index, &from);
            let b = ensure_node(&mut graph, &mut index, &to);
            if seen_edges.insert((a, b, EdgeKind::Directed)) {
                graph.add_edge(a, b, EdgeKind::Directed);
            }
        }
        for (left, right) in self.bidirected {
            if left == right {
                return Err(StructuralError::SelfLoop(left));
            }
            let a = ensure_node(&mut graph, &mut index, &left);
            let b = ensure_node(&mut graph, &mut index, &right);
            // Symmetric link: one stored edge covers both orientations.
            if !seen_edges.contains(&(b, a, EdgeKind::Bidirected))
                && seen_edges.insert((a, b, EdgeKind::Bidirected))
            {
                graph.add_edge(a, b, EdgeKind::Bidirected);
            }
        }

        for t in &self.treatments {
            if self.outcomes.contains(t) {
                return Err(StructuralError::ConflictingRoles(t.clone()));
            }
        }
        let treatment_ids = resolve_all(&index, &self.treatments)?;
        let outcome_ids = resolve_all(&index, &self.outcomes)?;

        if let Some(columns) = &self.observed_columns {
            let present: HashSet<&str> = columns.iter().map(String::as_str).collect();
            for id in graph.node_indices().collect::<Vec<_>>() {
                let variable = &mut graph[id];
                variable.observed = present.contains(variable.name.as_str());
            }
        }

        for &id in &treatment_ids {
            graph[id].add_role(VariableRole::Treatment);
        }
        for &id in &outcome_ids {
            graph[id].add_role(VariableRole::Outcome);
        }
        for (name, role) in roles {
            let id = *index
                .get(&name)
                .ok_or(StructuralError::UnknownNode(name))?;
            graph[id].add_role(role);
        }
        for name in self.unobserved {
            let id = *index
                .get(&name)
                .ok_or(StructuralError::UnknownNode(name))?;
            graph[id].observed = false;
        }

        for id in graph.node_indices() {
            let variable = &graph[id];
            let special = variable.has_role(VariableRole::Treatment)
                || variable.has_role(VariableRole::Outcome);
            if variable.has_role(VariableRole::Treatment) && variable.has_role(VariableRole::Outcome)
            {
                return Err(StructuralError::ConflictingRoles(variable.name.clone()));
            }
            if variable.roles.len() > 1 && !special {
                return Err(StructuralError::ConflictingRoles(variable.name.clone()));
            }
        }

        if self.missing_nodes_as_confounders {
            if let Some(columns) = &self.observed_columns {
                for column in columns {
                    if index.contains_key(column) {
                        continue;
                    }
                    let id = graph.add_node(
                        Variable::observed(column.clone()).with_role(VariableRole::CommonCause),
                    );
                    index.insert(column.clone(), id);
                    for &t in &treatment_ids {
                        graph.add_edge(id, t, EdgeKind::Directed);
                    }
                    for &y in &outcome_ids {
                        graph.add_edge(id, y, EdgeKind::Directed);
                    }
                    events.push(IdentificationEvent::ColumnAssumedConfounder {
                        name: column.clone(),
                    });
                }
            }
        }

        CausalGraph::from_parts(graph, index, treatment_ids, outcome_ids, events)
    }
}

fn ensure_node(
    graph: &mut StableDiGraph<Variable, EdgeKind>,
    index: &mut HashMap<String, NodeId>,
    name: &str,
) -> NodeId {
    if let Some(&id) = index.get(name) {
        return id;
    }
    let id = graph.add_node(Variable::observed(name));
    index.insert(name.to_string(), id);
    id
}

fn resolve_all(
    index: &HashMap<String, NodeId>,
    names: &[String],
) -> Result<Vec<NodeId>, StructuralError> {
    names
        .iter()
        .map(|name| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| StructuralError::UnknownNode(name.clone()))
        })
        .collect()
}
