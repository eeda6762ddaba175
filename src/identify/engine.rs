//! engine.rs
//! Orchestrates the identification attempts over an immutable graph
//! snapshot: `Start → {BackdoorSearch ∥ IVCheck} → FrontdoorCheck → Done`.
//!
//! The engine always runs to `Done`; a method that fails to identify the
//! effect leaves its slot empty and never aborts the others.

use super::estimand::{EstimandType, IdentifiedEstimand, IdentifierMethod};
use super::{backdoor, frontdoor, instrument};
use crate::analysis::report::IdentificationEvent;
use crate::graph::CausalGraph;

/// Knobs for one identification run.
#[derive(Debug, Clone)]
pub struct IdentificationConfig {
    pub estimand_type: EstimandType,
    /// Attempt backdoor identification over observed sets even when latent
    /// confounders are present. Off by default: unobserved confounding
    /// defeats the backdoor criterion unless explicitly overridden.
    pub proceed_when_unidentifiable: bool,
    /// Upper bound on the subset searches. `None` means every candidate may
    /// be used, which is exponential in the worst case; large graphs should
    /// set a small bound.
    pub max_adjustment_size: Option<usize>,
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            estimand_type: EstimandType::NonparametricAte,
            proceed_when_unidentifiable: false,
            max_adjustment_size: None,
        }
    }
}

pub struct IdentificationEngine<'a> {
    graph: &'a CausalGraph,
    config: IdentificationConfig,
}

impl<'a> IdentificationEngine<'a> {
    pub fn new(graph: &'a CausalGraph, config: IdentificationConfig) -> Self {
        Self { graph, config }
    }

    /// Runs every identification method and collects the results. The
    /// backdoor and instrument attempts are independent reads of the graph
    /// and run in parallel; front-door only runs if backdoor found nothing.
    pub fn identify_effect(&self) -> IdentifiedEstimand {
        let treatments = self
            .graph
            .treatments()
            .iter()
            .map(|&id| self.graph.name(id).to_string())
            .collect();
        let outcomes = self
            .graph
            .outcomes()
            .iter()
            .map(|&id| self.graph.name(id).to_string())
            .collect();

        let mut result = IdentifiedEstimand::new(treatments, outcomes, self.config.estimand_type);
        result
            .report_mut()
            .extend(self.graph.construction_events().iter().cloned());

        let (backdoor_outcome, iv_outcome) = rayon::join(
            || {
                backdoor::search(
                    self.graph,
                    self.config.proceed_when_unidentifiable,
                    self.config.max_adjustment_size,
                )
            },
            || instrument::check(self.graph),
        );

        // The attempts carry no data dependency; merge in a fixed order so
        // reports stay deterministic.
        result.report_mut().extend(backdoor_outcome.events);
        result.set_result(IdentifierMethod::Backdoor, backdoor_outcome.estimand);
        result.report_mut().extend(iv_outcome.events);
        result.set_result(IdentifierMethod::Iv, iv_outcome.estimand);

        if result.estimand(IdentifierMethod::Backdoor).is_none() {
            let frontdoor_outcome = frontdoor::search(self.graph, self.config.max_adjustment_size);
            result.report_mut().extend(frontdoor_outcome.events);
            result.set_result(IdentifierMethod::Frontdoor, frontdoor_outcome.estimand);
        } else {
            result.report_mut().push(IdentificationEvent::FrontdoorSkipped);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::report::IdentificationEvent;
    use crate::graph::CausalGraphBuilder;
    use crate::identify::estimand::Estimand;
    use rstest::rstest;

    fn identify(graph: &CausalGraph, proceed: bool) -> IdentifiedEstimand {
        let config = IdentificationConfig {
            proceed_when_unidentifiable: proceed,
            ..Default::default()
        };
        IdentificationEngine::new(graph, config).identify_effect()
    }

    fn adjustment_set(result: &IdentifiedEstimand) -> Option<Vec<String>> {
        match result.estimand(IdentifierMethod::Backdoor) {
            Some(Estimand::Backdoor { adjustment_set }) => Some(adjustment_set.clone()),
            _ => None,
        }
    }

    #[rstest]
    #[case::confounded(
        &[("z", "t"), ("z", "y"), ("t", "y")],
        Some(&["z"][..]),
        None
    )]
    #[case::bare_effect(&[("t", "y")], Some(&[][..]), None)]
    #[case::instrumented(
        &[("w", "t"), ("t", "y")],
        Some(&[][..]),
        Some(&["w"][..])
    )]
    fn identification_scenarios(
        #[case] edges: &[(&str, &str)],
        #[case] expected_backdoor: Option<&[&str]>,
        #[case] expected_instruments: Option<&[&str]>,
    ) {
        let mut builder = CausalGraphBuilder::new(["t"], ["y"]);
        for (from, to) in edges {
            builder = builder.edge(*from, *to);
        }
        let graph = builder.build().unwrap();
        let result = identify(&graph, false);

        assert_eq!(
            adjustment_set(&result).as_deref(),
            expected_backdoor
                .map(|names| names.iter().map(|s| s.to_string()).collect::<Vec<_>>())
                .as_deref()
        );
        match (result.estimand(IdentifierMethod::Iv), expected_instruments) {
            (Some(Estimand::InstrumentalVariable { instruments }), Some(expected)) => {
                let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
                assert_eq!(instruments, &expected);
            }
            (None, None) => {}
            (actual, expected) => panic!("iv slot {actual:?}, expected {expected:?}"),
        }
    }

    #[test]
    fn latent_confounding_defeats_backdoor_by_default() {
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("u", "t")
            .edge("u", "y")
            .edge("t", "y")
            .mark_unobserved("u")
            .build()
            .unwrap();
        let result = identify(&graph, false);

        assert_eq!(result.estimand(IdentifierMethod::Backdoor), None);
        assert!(result
            .report()
            .contains(&IdentificationEvent::BackdoorDefeatedByLatentConfounding));
        assert!(!result.is_identified());
    }

    #[test]
    fn proceeding_under_caution_still_fails_without_an_observed_blocker() {
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("u", "t")
            .edge("u", "y")
            .edge("t", "y")
            .mark_unobserved("u")
            .build()
            .unwrap();
        let result = identify(&graph, true);

        // The confounder is unmeasured, so no observed set can block it; the
        // slot stays empty but the run is annotated, not failed.
        assert_eq!(result.estimand(IdentifierMethod::Backdoor), None);
        assert!(result
            .report()
            .contains(&IdentificationEvent::ProceedingUnderCaution));
        assert!(result
            .report()
            .contains(&IdentificationEvent::BackdoorSearchExhausted { max_size: 0 }));
    }

    #[test]
    fn proceeding_under_caution_can_adjust_on_an_observed_descendant_of_the_confounder() {
        // u is unmeasured, but every backdoor route runs through observed p.
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("u", "t")
            .edge("u", "p")
            .edge("p", "y")
            .edge("t", "y")
            .mark_unobserved("u")
            .build()
            .unwrap();
        let result = identify(&graph, true);

        assert_eq!(adjustment_set(&result).unwrap(), vec!["p"]);
        assert!(result
            .report()
            .contains(&IdentificationEvent::AdjustmentSetFound {
                adjustment_set: vec!["p".into()]
            }));
    }

    #[test]
    fn adding_a_latent_link_never_turns_a_null_backdoor_result_non_null() {
        let confounded = CausalGraphBuilder::new(["t"], ["y"])
            .edge("z", "t")
            .edge("z", "y")
            .edge("t", "y")
            .build()
            .unwrap();
        assert_eq!(adjustment_set(&identify(&confounded, false)).unwrap(), vec!["z"]);

        let with_latent = CausalGraphBuilder::new(["t"], ["y"])
            .edge("z", "t")
            .edge("z", "y")
            .edge("t", "y")
            .bidirected("t", "y")
            .build()
            .unwrap();
        // Strict mode: the guard nulls the previously non-null result.
        assert_eq!(adjustment_set(&identify(&with_latent, false)), None);
        // Permissive mode: no observed set can block the latent link either.
        assert_eq!(adjustment_set(&identify(&with_latent, true)), None);
    }

    #[test]
    fn adjustment_sets_never_contain_descendants_of_treatment() {
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("z", "t")
            .edge("z", "y")
            .edge("t", "m")
            .edge("m", "y")
            .build()
            .unwrap();
        let set = adjustment_set(&identify(&graph, false)).unwrap();
        assert_eq!(set, vec!["z"]);
        assert!(!set.contains(&"m".to_string()));
    }

    #[test]
    fn instrument_with_a_direct_edge_to_outcome_is_always_rejected() {
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("w", "t")
            .edge("w", "y")
            .edge("t", "y")
            .annotate("w", crate::graph::VariableRole::Instrument)
            .build()
            .unwrap();
        let result = identify(&graph, false);

        assert_eq!(result.estimand(IdentifierMethod::Iv), None);
        assert!(result.report().events().iter().any(|e| matches!(
            e,
            IdentificationEvent::InstrumentRejected { name, .. } if name == "w"
        )));
    }

    #[test]
    fn frontdoor_identifies_the_classic_mediated_graph() {
        // Latent confounding over t and y, with the effect fully mediated by m.
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("u", "t")
            .edge("u", "y")
            .edge("t", "m")
            .edge("m", "y")
            .mark_unobserved("u")
            .build()
            .unwrap();
        let result = identify(&graph, true);

        assert_eq!(result.estimand(IdentifierMethod::Backdoor), None);
        assert_eq!(
            result.estimand(IdentifierMethod::Frontdoor),
            Some(&Estimand::Frontdoor {
                mediators: vec!["m".into()]
            })
        );
        assert!(result.is_identified());
    }

    #[test]
    fn frontdoor_is_skipped_when_backdoor_succeeds() {
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("z", "t")
            .edge("z", "y")
            .edge("t", "m")
            .edge("m", "y")
            .build()
            .unwrap();
        let result = identify(&graph, false);

        assert!(adjustment_set(&result).is_some());
        assert_eq!(result.estimand(IdentifierMethod::Frontdoor), None);
        assert!(result
            .report()
            .contains(&IdentificationEvent::FrontdoorSkipped));
    }

    #[test]
    fn construction_events_lead_the_report() {
        let graph = CausalGraphBuilder::new(["t"], ["y"])
            .edge("t", "y")
            .observed_columns(["t", "y", "extra"])
            .missing_nodes_as_confounders(true)
            .build()
            .unwrap();
        let result = identify(&graph, false);

        assert_eq!(
            result.report().events()[0],
            IdentificationEvent::ColumnAssumedConfounder {
                name: "extra".into()
            }
        );
        // The synthetic confounder ends up in the adjustment set.
        assert_eq!(adjustment_set(&result).unwrap(), vec!["extra"]);
    }

    #[test]
    fn multi_treatment_names_are_preserved_in_order() {
        let graph = CausalGraphBuilder::new(["t2", "t1"], ["y"])
            .edge("t1", "y")
            .edge("t2", "y")
            .build()
            .unwrap();
        let result = identify(&graph, false);
        assert_eq!(result.treatments(), &["t2".to_string(), "t1".to_string()]);
        assert_eq!(result.outcomes(), &["y".to_string()]);
    }
}
