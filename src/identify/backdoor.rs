//! backdoor.rs
//! Bounded search for a minimal backdoor adjustment set.

use super::estimand::Estimand;
use super::subsets::Combinations;
use super::MethodOutcome;
use crate::analysis::report::IdentificationEvent;
use crate::analysis::separation::SeparationOracle;
use crate::graph::{CausalGraph, NodeId};

/// Searches for an observed adjustment set that blocks every backdoor path
/// from the treatments to the outcomes.
///
/// Policy: latent confounding defeats the method outright unless the caller
/// opted to proceed. The declared common-cause set is preferred; beyond it,
/// candidate subsets are tried in increasing size (lexicographic name order
/// within a size) up to `max_adjustment_size`, so the first hit is minimal.
pub(crate) fn search(
    graph: &CausalGraph,
    proceed_when_unidentifiable: bool,
    max_adjustment_size: Option<usize>,
) -> MethodOutcome {
    let mut events = Vec::new();
    let treatments = graph.treatments().to_vec();
    let outcomes = graph.outcomes().to_vec();

    let latent = graph.latent_confounders(&treatments, &outcomes);
    if !latent.is_empty() {
        events.push(IdentificationEvent::LatentConfoundersDetected { names: latent });
        if !proceed_when_unidentifiable {
            events.push(IdentificationEvent::BackdoorDefeatedByLatentConfounding);
            return MethodOutcome {
                estimand: None,
                events,
            };
        }
        events.push(IdentificationEvent::ProceedingUnderCaution);
    }

    let oracle = SeparationOracle::new(graph);

    // The declared common causes, kept to their observed members. On an
    // explicit graph this is the structurally derived set; on a synthesized
    // graph structure and declaration coincide.
    let declared: Vec<NodeId> = graph
        .common_cause_ids(&treatments, &outcomes)
        .into_iter()
        .filter(|&id| graph.is_observed(id))
        .collect();

    // Remaining candidates: observed, not treatment or outcome, not a
    // descendant of any treatment, not already conditioned on.
    let desc_t = graph.descendant_closure(&treatments);
    let mut candidates: Vec<NodeId> = graph
        .graph
        .node_indices()
        .filter(|&id| graph.is_observed(id))
        .filter(|id| !treatments.contains(id) && !outcomes.contains(id))
        .filter(|id| !desc_t.contains(id))
        .filter(|id| !declared.contains(id))
        .collect();
    candidates.sort_by(|a, b| graph.name(*a).cmp(graph.name(*b)));

    let bound = max_adjustment_size
        .unwrap_or(candidates.len())
        .min(candidates.len());

    for size in 0..=bound {
        for combo in Combinations::new(candidates.len(), size) {
            let mut conditioning: Vec<NodeId> = combo.iter().map(|&i| candidates[i]).collect();
            conditioning.extend(&declared);

            let separated = oracle.is_separated_removing_outgoing(
                &treatments,
                &treatments,
                &outcomes,
                &conditioning,
            );
            if !separated {
                continue;
            }

            let adjustment_set = graph.sorted_names(conditioning);
            if size == 0 && !declared.is_empty() {
                events.push(IdentificationEvent::DeclaredSetSeparates {
                    adjustment_set: adjustment_set.clone(),
                });
            } else {
                events.push(IdentificationEvent::AdjustmentSetFound {
                    adjustment_set: adjustment_set.clone(),
                });
            }
            return MethodOutcome {
                estimand: Some(Estimand::Backdoor { adjustment_set }),
                events,
            };
        }
    }

    events.push(IdentificationEvent::BackdoorSearchExhausted { max_size: bound });
    MethodOutcome {
        estimand: None,
        events,
    }
}
