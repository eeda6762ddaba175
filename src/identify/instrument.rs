//! instrument.rs
//! Validates instrument candidates against the three instrument conditions.

use super::estimand::Estimand;
use super::MethodOutcome;
use crate::analysis::report::{IdentificationEvent, InstrumentRejection};
use crate::graph::{CausalGraph, NodeId, VariableRole};
use std::collections::HashSet;

/// Checks every candidate instrument (structurally derived ones plus any the
/// caller tagged) against relevance, exclusion and exogeneity. All survivors
/// are reported in a single estimand; the estimator downstream picks among
/// them.
pub(crate) fn check(graph: &CausalGraph) -> MethodOutcome {
    let mut events = Vec::new();
    let treatments = graph.treatments().to_vec();
    let outcomes = graph.outcomes().to_vec();

    let anc_t = graph.ancestral_closure(&treatments);
    let t_set: HashSet<NodeId> = treatments.iter().copied().collect();
    let y_set: HashSet<NodeId> = outcomes.iter().copied().collect();

    let mut candidates: Vec<NodeId> = graph.instrument_ids(&treatments, &outcomes);
    for id in graph.graph.node_indices() {
        if graph.variable(id).has_role(VariableRole::Instrument)
            && !candidates.contains(&id)
            && !t_set.contains(&id)
            && !y_set.contains(&id)
        {
            candidates.push(id);
        }
    }
    // Unmeasured candidates are useless to an estimator.
    candidates.retain(|&id| graph.is_observed(id));
    candidates.sort_by(|a, b| graph.name(*a).cmp(graph.name(*b)));

    let mut accepted: Vec<NodeId> = Vec::new();
    for &candidate in &candidates {
        let name = graph.name(candidate).to_string();

        // (i) Relevance: the instrument must move the treatment.
        if !anc_t.contains(&candidate) {
            events.push(IdentificationEvent::InstrumentRejected {
                name,
                reason: InstrumentRejection::NotRelevant,
            });
            continue;
        }
        // (ii) Exclusion: no route to the outcome except through treatment.
        if outcomes.iter().any(|&y| graph.has_directed_edge(candidate, y)) {
            events.push(IdentificationEvent::InstrumentRejected {
                name,
                reason: InstrumentRejection::DirectEdgeToOutcome,
            });
            continue;
        }
        if graph.reaches_avoiding(candidate, &y_set, &t_set) {
            events.push(IdentificationEvent::InstrumentRejected {
                name,
                reason: InstrumentRejection::UnblockedPathToOutcome,
            });
            continue;
        }
        // (iii) Exogeneity: no latent confounder shared with the outcome.
        if confounded_with_outcome(graph, candidate, &outcomes) {
            events.push(IdentificationEvent::InstrumentRejected {
                name,
                reason: InstrumentRejection::ConfoundedWithOutcome,
            });
            continue;
        }
        accepted.push(candidate);
    }

    if accepted.is_empty() {
        events.push(IdentificationEvent::NoValidInstrument);
        return MethodOutcome {
            estimand: None,
            events,
        };
    }

    let instruments = graph.sorted_names(accepted);
    events.push(IdentificationEvent::InstrumentsAccepted {
        names: instruments.clone(),
    });
    MethodOutcome {
        estimand: Some(Estimand::InstrumentalVariable { instruments }),
        events,
    }
}

/// A bidirected link to an outcome, or an unobserved common ancestor shared
/// with one, ties the candidate to the outcome through a latent route.
fn confounded_with_outcome(graph: &CausalGraph, candidate: NodeId, outcomes: &[NodeId]) -> bool {
    if outcomes.iter().any(|&y| graph.has_bidirected_link(candidate, y)) {
        return true;
    }
    let anc_w = graph.ancestral_closure(&[candidate]);
    let anc_y = graph.ancestral_closure(outcomes);
    graph
        .graph
        .node_indices()
        .any(|id| !graph.is_observed(id) && anc_w.contains(&id) && anc_y.contains(&id))
}
