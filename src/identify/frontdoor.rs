//! frontdoor.rs
//! Mediator-set search for front-door identification. Attempted only when
//! the backdoor search comes up empty.

use super::estimand::Estimand;
use super::subsets::Combinations;
use super::MethodOutcome;
use crate::analysis::report::IdentificationEvent;
use crate::analysis::separation::SeparationOracle;
use crate::graph::{CausalGraph, NodeId};
use std::collections::HashSet;

/// Looks for an observed mediator set M satisfying the front-door criterion:
/// M intercepts every directed treatment→outcome route, no backdoor path
/// runs from treatment into M, and treatment blocks every backdoor path from
/// M to the outcome. Subsets are tried in increasing size under the same
/// bound as the backdoor search.
pub(crate) fn search(graph: &CausalGraph, max_size: Option<usize>) -> MethodOutcome {
    let mut events = Vec::new();
    let treatments = graph.treatments().to_vec();
    let outcomes = graph.outcomes().to_vec();
    let y_set: HashSet<NodeId> = outcomes.iter().copied().collect();

    let oracle = SeparationOracle::new(graph);

    // Only variables strictly between treatment and outcome can mediate.
    let desc_t = graph.descendant_closure(&treatments);
    let anc_y = graph.ancestral_closure(&outcomes);
    let mut candidates: Vec<NodeId> = graph
        .graph
        .node_indices()
        .filter(|&id| graph.is_observed(id))
        .filter(|id| !treatments.contains(id) && !outcomes.contains(id))
        .filter(|id| desc_t.contains(id) && anc_y.contains(id))
        .collect();
    candidates.sort_by(|a, b| graph.name(*a).cmp(graph.name(*b)));

    let bound = max_size.unwrap_or(candidates.len()).min(candidates.len());

    for size in 1..=bound {
        for combo in Combinations::new(candidates.len(), size) {
            let mediators: Vec<NodeId> = combo.iter().map(|&i| candidates[i]).collect();

            if !fully_mediates(graph, &treatments, &y_set, &mediators) {
                continue;
            }
            // No unblocked backdoor route from treatment into the mediators.
            if !oracle.is_separated_removing_outgoing(&treatments, &treatments, &mediators, &[]) {
                continue;
            }
            // Treatment blocks every backdoor route from mediators to outcome.
            if !oracle.is_separated_removing_outgoing(&mediators, &mediators, &outcomes, &treatments)
            {
                continue;
            }

            let mediators = graph.sorted_names(mediators);
            events.push(IdentificationEvent::MediatorSetFound {
                mediators: mediators.clone(),
            });
            return MethodOutcome {
                estimand: Some(Estimand::Frontdoor { mediators }),
                events,
            };
        }
    }

    events.push(IdentificationEvent::FrontdoorSearchExhausted { max_size: bound });
    MethodOutcome {
        estimand: None,
        events,
    }
}

/// True when deleting the mediators cuts every directed route from the
/// treatments to an outcome.
fn fully_mediates(
    graph: &CausalGraph,
    treatments: &[NodeId],
    outcomes: &HashSet<NodeId>,
    mediators: &[NodeId],
) -> bool {
    let blocked: HashSet<NodeId> = mediators.iter().copied().collect();
    !treatments
        .iter()
        .any(|&t| graph.reaches_avoiding(t, outcomes, &blocked))
}
