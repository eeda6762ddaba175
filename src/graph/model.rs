//! model.rs
//! The immutable causal graph: structural traversals and role queries.
//!
//! A `CausalGraph` is a snapshot. Structural changes go through a fresh
//! `CausalGraphBuilder` run; every query here is a pure function over the
//! snapshot, so derived roles can never drift out of sync with the edges.

use super::edge::EdgeKind;
use super::error::StructuralError;
use super::variable::{NodeId, Variable, VariableRole};
use crate::analysis::report::IdentificationEvent;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct CausalGraph {
    pub(crate) graph: StableDiGraph<Variable, EdgeKind>,
    pub(crate) index: HashMap<String, NodeId>,
    treatments: Vec<NodeId>,
    outcomes: Vec<NodeId>,
    construction_events: Vec<IdentificationEvent>,
}

impl CausalGraph {
    /// Final assembly step, called by the builder once nodes and edges are in
    /// place. Rejects graphs whose directed subgraph contains a cycle.
    pub(crate) fn from_parts(
        graph: StableDiGraph<Variable, EdgeKind>,
        index: HashMap<String, NodeId>,
        treatments: Vec<NodeId>,
        outcomes: Vec<NodeId>,
        construction_events: Vec<IdentificationEvent>,
    ) -> Result<Self, StructuralError> {
        let model = Self {
            graph,
            index,
            treatments,
            outcomes,
            construction_events,
        };
        model.assert_acyclic()?;
        Ok(model)
    }

    // --- Accessors ---

    pub fn variable(&self, id: NodeId) -> &Variable {
        &self.graph[id]
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.graph[id].name
    }

    pub fn is_observed(&self, id: NodeId) -> bool {
        self.graph[id].observed
    }

    pub fn node_id(&self, name: &str) -> Result<NodeId, StructuralError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| StructuralError::UnknownNode(name.to_string()))
    }

    pub fn treatments(&self) -> &[NodeId] {
        &self.treatments
    }

    pub fn outcomes(&self) -> &[NodeId] {
        &self.outcomes
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// All variable names, sorted.
    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn construction_events(&self) -> &[IdentificationEvent] {
        &self.construction_events
    }

    pub(crate) fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<NodeId>, StructuralError> {
        names.iter().map(|n| self.node_id(n.as_ref())).collect()
    }

    /// Sorted names for a set of node ids. The lexicographic order doubles as
    /// the deterministic tie-break everywhere candidate sets are reported.
    pub(crate) fn sorted_names(&self, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
        let mut names: Vec<String> = ids.into_iter().map(|id| self.name(id).to_string()).collect();
        names.sort();
        names
    }

    // --- Edge-level queries ---

    pub(crate) fn directed_parents(&self, id: NodeId) -> Vec<NodeId> {
        self.graph
            .edges_directed(id, Direction::Incoming)
            .filter(|e| *e.weight() == EdgeKind::Directed)
            .map(|e| e.source())
            .collect()
    }

    pub(crate) fn directed_children(&self, id: NodeId) -> Vec<NodeId> {
        self.graph
            .edges_directed(id, Direction::Outgoing)
            .filter(|e| *e.weight() == EdgeKind::Directed)
            .map(|e| e.target())
            .collect()
    }

    pub(crate) fn has_directed_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.graph
            .edges_directed(from, Direction::Outgoing)
            .any(|e| e.target() == to && *e.weight() == EdgeKind::Directed)
    }

    pub(crate) fn has_bidirected_link(&self, a: NodeId, b: NodeId) -> bool {
        self.graph
            .edges_directed(a, Direction::Outgoing)
            .chain(self.graph.edges_directed(a, Direction::Incoming))
            .any(|e| {
                *e.weight() == EdgeKind::Bidirected
                    && (e.source() == b || e.target() == b)
            })
    }

    // --- Transitive closures ---

    /// All nodes with a directed path *into* any of `start`, including the
    /// start nodes themselves. Bidirected edges do not extend the closure.
    pub(crate) fn ancestral_closure(&self, start: &[NodeId]) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeId> = start.iter().copied().collect();

        while let Some(node) = queue.pop_front() {
            if visited.insert(node) {
                for parent in self.directed_parents(node) {
                    queue.push_back(parent);
                }
            }
        }
        visited
    }

    /// All nodes reachable from any of `start` over directed edges, including
    /// the start nodes themselves.
    pub(crate) fn descendant_closure(&self, start: &[NodeId]) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<NodeId> = start.iter().copied().collect();

        while let Some(node) = queue.pop_front() {
            if visited.insert(node) {
                for child in self.directed_children(node) {
                    queue.push_back(child);
                }
            }
        }
        visited
    }

    /// BFS over directed children from `from`, never entering `blocked`.
    /// Returns true if any of `targets` is reachable.
    pub(crate) fn reaches_avoiding(
        &self,
        from: NodeId,
        targets: &HashSet<NodeId>,
        blocked: &HashSet<NodeId>,
    ) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(from);
        visited.insert(from);

        while let Some(node) = queue.pop_front() {
            for child in self.directed_children(node) {
                if blocked.contains(&child) {
                    continue;
                }
                if targets.contains(&child) {
                    return true;
                }
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        false
    }

    /// Strict ancestors of a single named node, sorted.
    pub fn ancestors(&self, name: &str) -> Result<Vec<String>, StructuralError> {
        let id = self.node_id(name)?;
        let mut closure = self.ancestral_closure(&[id]);
        closure.remove(&id);
        Ok(self.sorted_names(closure))
    }

    /// Strict descendants of a single named node, sorted.
    pub fn descendants(&self, name: &str) -> Result<Vec<String>, StructuralError> {
        let id = self.node_id(name)?;
        let mut closure = self.descendant_closure(&[id]);
        closure.remove(&id);
        Ok(self.sorted_names(closure))
    }

    // --- Role queries ---
    // The engine recomputes these from structure on every call rather than
    // trusting role tags; declared tags only matter on the synthesized-graph
    // path, where structure and tags coincide by construction.

    /// Ancestors of at least one treatment and at least one outcome, excluding
    /// descendants of any treatment (mediators are not confounders) and the
    /// treatment/outcome sets themselves.
    pub fn common_causes_of<S: AsRef<str>>(
        &self,
        treatments: &[S],
        outcomes: &[S],
    ) -> Result<Vec<String>, StructuralError> {
        let t = self.resolve(treatments)?;
        let y = self.resolve(outcomes)?;
        Ok(self.sorted_names(self.common_cause_ids(&t, &y)))
    }

    pub(crate) fn common_cause_ids(&self, treatments: &[NodeId], outcomes: &[NodeId]) -> Vec<NodeId> {
        let mut anc_t = self.ancestral_closure(treatments);
        let anc_y = self.ancestral_closure(outcomes);
        let desc_t = self.descendant_closure(treatments);
        anc_t.retain(|id| {
            anc_y.contains(id)
                && !desc_t.contains(id)
                && !treatments.contains(id)
                && !outcomes.contains(id)
        });
        let mut ids: Vec<NodeId> = anc_t.into_iter().collect();
        ids.sort_by(|a, b| self.name(*a).cmp(self.name(*b)));
        ids
    }

    /// Ancestors of a treatment with no direct edge into an outcome and no
    /// directed route to an outcome that avoids every treatment.
    pub fn instruments_for<S: AsRef<str>>(
        &self,
        treatments: &[S],
        outcomes: &[S],
    ) -> Result<Vec<String>, StructuralError> {
        let t = self.resolve(treatments)?;
        let y = self.resolve(outcomes)?;
        Ok(self.sorted_names(self.instrument_ids(&t, &y)))
    }

    pub(crate) fn instrument_ids(&self, treatments: &[NodeId], outcomes: &[NodeId]) -> Vec<NodeId> {
        let anc_t = self.ancestral_closure(treatments);
        let t_set: HashSet<NodeId> = treatments.iter().copied().collect();
        let y_set: HashSet<NodeId> = outcomes.iter().copied().collect();

        let mut ids: Vec<NodeId> = self
            .graph
            .node_indices()
            .filter(|id| !t_set.contains(id) && !y_set.contains(id))
            .filter(|id| anc_t.contains(id))
            .filter(|&id| !outcomes.iter().any(|&o| self.has_directed_edge(id, o)))
            .filter(|&id| !self.reaches_avoiding(id, &y_set, &t_set))
            .collect();
        ids.sort_by(|a, b| self.name(*a).cmp(self.name(*b)));
        ids
    }

    /// Observed non-causes of treatment that sit upstream of an outcome, or
    /// were explicitly tagged as modifiers.
    pub fn effect_modifiers_for<S: AsRef<str>>(
        &self,
        treatments: &[S],
        outcomes: &[S],
    ) -> Result<Vec<String>, StructuralError> {
        let t = self.resolve(treatments)?;
        let y = self.resolve(outcomes)?;
        Ok(self.sorted_names(self.effect_modifier_ids(&t, &y)))
    }

    pub(crate) fn effect_modifier_ids(&self, treatments: &[NodeId], outcomes: &[NodeId]) -> Vec<NodeId> {
        let anc_t = self.ancestral_closure(treatments);
        let anc_y = self.ancestral_closure(outcomes);

        let mut ids: Vec<NodeId> = self
            .graph
            .node_indices()
            .filter(|id| !treatments.contains(id) && !outcomes.contains(id))
            .filter(|id| self.is_observed(*id))
            .filter(|id| !anc_t.contains(id))
            .filter(|&id| {
                anc_y.contains(&id) || self.graph[id].has_role(VariableRole::EffectModifier)
            })
            .collect();
        ids.sort_by(|a, b| self.name(*a).cmp(self.name(*b)));
        ids
    }

    /// Names of every latent confounder of the treatment/outcome pair: an
    /// unobserved (or tagged) node upstream of both sides, or a bidirected
    /// link whose endpoints straddle the two ancestral sets. Bidirected links
    /// are reported as `"a <-> b"`.
    pub(crate) fn latent_confounders(&self, treatments: &[NodeId], outcomes: &[NodeId]) -> Vec<String> {
        let anc_t = self.ancestral_closure(treatments);
        let anc_y = self.ancestral_closure(outcomes);

        let mut names: Vec<String> = self
            .graph
            .node_indices()
            .filter(|&id| {
                let var = &self.graph[id];
                let confounds = anc_t.contains(&id) && anc_y.contains(&id);
                (!var.observed && confounds) || var.has_role(VariableRole::UnobservedConfounder)
            })
            .map(|id| self.name(id).to_string())
            .collect();

        for edge in self.graph.edge_references() {
            if *edge.weight() != EdgeKind::Bidirected {
                continue;
            }
            let (a, b) = (edge.source(), edge.target());
            let straddles = (anc_t.contains(&a) && anc_y.contains(&b))
                || (anc_t.contains(&b) && anc_y.contains(&a));
            if straddles {
                names.push(format!("{} <-> {}", self.name(a), self.name(b)));
            }
        }

        names.sort();
        names.dedup();
        names
    }

    // --- Structural validation ---

    fn assert_acyclic(&self) -> Result<(), StructuralError> {
        let mut state: HashMap<NodeId, VisitState> = HashMap::new();

        for id in self.graph.node_indices() {
            if !state.contains_key(&id) {
                self.visit(id, &mut state)?;
            }
        }
        Ok(())
    }

    fn visit(&self, node: NodeId, state: &mut HashMap<NodeId, VisitState>) -> Result<(), StructuralError> {
        match state.get(&node).copied() {
            Some(VisitState::Visited) => return Ok(()),
            Some(VisitState::Visiting) => {
                return Err(StructuralError::CycleDetected(self.name(node).to_string()))
            }
            None => {
                state.insert(node, VisitState::Visiting);
            }
        }

        for child in self.directed_children(node) {
            self.visit(child, state)?;
        }

        state.insert(node, VisitState::Visited);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting, // Used for cycle detection
    Visited,
}

#[cfg(test)]
mod tests {
    use crate::graph::builder::CausalGraphBuilder;
    use crate::graph::error::StructuralError;

    fn chain_graph() -> crate::graph::CausalGraph {
        // Z -> T -> Y with Z also pointing at Y.
        CausalGraphBuilder::new(["t"], ["y"])
            .edge("z", "t")
            .edge("z", "y")
            .edge("t", "y")
            .build()
            .expect("valid graph")
    }

    #[test]
    fn ancestors_and_descendants_exclude_self() {
        let g = chain_graph();
        assert_eq!(g.ancestors("y").unwrap(), vec!["t", "z"]);
        assert_eq!(g.descendants("z").unwrap(), vec!["t", "y"]);
        assert!(g.ancestors("z").unwrap().is_empty());
    }

    #[test]
    fn unknown_node_is_rejected() {
        let g = chain_graph();
        assert_eq!(
            g.ancestors("nope").unwrap_err(),
            StructuralError::UnknownNode("nope".into())
        );
    }

    #[test]
    fn common_causes_exclude_mediators() {
        // Z confounds, M mediates. Only Z is a common cause.
        let g = CausalGraphBuilder::new(["t"], ["y"])
            .edge("z", "t")
            .edge("z", "y")
            .edge("t", "m")
            .edge("m", "y")
            .build()
            .unwrap();
        assert_eq!(g.common_causes_of(&["t"], &["y"]).unwrap(), vec!["z"]);
    }

    #[test]
    fn instrument_query_rejects_direct_edge_to_outcome() {
        let g = CausalGraphBuilder::new(["t"], ["y"])
            .edge("w", "t")
            .edge("w", "y")
            .edge("t", "y")
            .build()
            .unwrap();
        assert!(g.instruments_for(&["t"], &["y"]).unwrap().is_empty());
    }

    #[test]
    fn instrument_query_accepts_exogenous_cause_of_treatment() {
        let g = CausalGraphBuilder::new(["t"], ["y"])
            .edge("w", "t")
            .edge("t", "y")
            .build()
            .unwrap();
        assert_eq!(g.instruments_for(&["t"], &["y"]).unwrap(), vec!["w"]);
    }

    #[test]
    fn effect_modifier_query_finds_outcome_causes_off_the_treatment_path() {
        let g = CausalGraphBuilder::new(["t"], ["y"])
            .edge("x", "y")
            .edge("t", "y")
            .build()
            .unwrap();
        assert_eq!(g.effect_modifiers_for(&["t"], &["y"]).unwrap(), vec!["x"]);
    }

    #[test]
    fn latent_confounders_include_bidirected_links() {
        let g = CausalGraphBuilder::new(["t"], ["y"])
            .edge("t", "y")
            .bidirected("t", "y")
            .build()
            .unwrap();
        assert_eq!(
            g.latent_confounders(g.treatments(), g.outcomes()),
            vec!["t <-> y"]
        );
    }
}
