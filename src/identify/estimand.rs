//! estimand.rs
//! The result container for one identification run: per-method estimand
//! slots, the diagnostics report, and the downstream method selection.

use super::error::IdentificationError;
use crate::analysis::report::IdentificationReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of identification strategies the engine attempts. Method
/// dispatch is by variant, never by string lookup; strings only appear at the
/// FFI boundary and are rejected there if unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdentifierMethod {
    Backdoor,
    Iv,
    Frontdoor,
}

impl IdentifierMethod {
    pub const ALL: [IdentifierMethod; 3] = [
        IdentifierMethod::Backdoor,
        IdentifierMethod::Iv,
        IdentifierMethod::Frontdoor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierMethod::Backdoor => "backdoor",
            IdentifierMethod::Iv => "iv",
            IdentifierMethod::Frontdoor => "frontdoor",
        }
    }
}

impl fmt::Display for IdentifierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierMethod {
    type Err = IdentificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backdoor" => Ok(IdentifierMethod::Backdoor),
            "iv" => Ok(IdentifierMethod::Iv),
            "frontdoor" => Ok(IdentifierMethod::Frontdoor),
            other => Err(IdentificationError::UnknownMethod(other.to_string())),
        }
    }
}

/// The kind of causal quantity requested. Closed enum; only the nonparametric
/// average treatment effect exists today, and unknown names die at the parse
/// boundary rather than deep inside the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstimandType {
    #[default]
    NonparametricAte,
}

impl EstimandType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimandType::NonparametricAte => "nonparametric-ate",
        }
    }

    pub fn parse(s: &str) -> Result<Self, IdentificationError> {
        match s {
            "nonparametric-ate" => Ok(EstimandType::NonparametricAte),
            other => Err(IdentificationError::UnsupportedEstimandType(
                other.to_string(),
            )),
        }
    }
}

/// A symbolic estimand: which observable quantity, computed over which
/// variable sets, equals the causal effect under the graph's assumptions.
/// The expression itself is opaque to this core; the estimator downstream
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Estimand {
    Backdoor { adjustment_set: Vec<String> },
    InstrumentalVariable { instruments: Vec<String> },
    Frontdoor { mediators: Vec<String> },
}

impl Estimand {
    pub fn method(&self) -> IdentifierMethod {
        match self {
            Estimand::Backdoor { .. } => IdentifierMethod::Backdoor,
            Estimand::InstrumentalVariable { .. } => IdentifierMethod::Iv,
            Estimand::Frontdoor { .. } => IdentifierMethod::Frontdoor,
        }
    }

    /// The variable set the estimand is parameterized by.
    pub fn variables(&self) -> &[String] {
        match self {
            Estimand::Backdoor { adjustment_set } => adjustment_set,
            Estimand::InstrumentalVariable { instruments } => instruments,
            Estimand::Frontdoor { mediators } => mediators,
        }
    }
}

impl fmt::Display for Estimand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimand::Backdoor { adjustment_set } => {
                write!(f, "adjust for {{{}}}", adjustment_set.join(", "))
            }
            Estimand::InstrumentalVariable { instruments } => {
                write!(f, "via instruments {{{}}}", instruments.join(", "))
            }
            Estimand::Frontdoor { mediators } => {
                write!(f, "via mediators {{{}}}", mediators.join(", "))
            }
        }
    }
}

/// Output of one `identify_effect` run. Immutable once the engine returns it,
/// except for the identifier-method selection recorded by the estimation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedEstimand {
    treatments: Vec<String>,
    outcomes: Vec<String>,
    estimand_type: EstimandType,
    estimands: BTreeMap<IdentifierMethod, Option<Estimand>>,
    report: IdentificationReport,
    selected_method: Option<IdentifierMethod>,
}

impl IdentifiedEstimand {
    pub(crate) fn new(
        treatments: Vec<String>,
        outcomes: Vec<String>,
        estimand_type: EstimandType,
    ) -> Self {
        let estimands = IdentifierMethod::ALL
            .into_iter()
            .map(|method| (method, None))
            .collect();
        Self {
            treatments,
            outcomes,
            estimand_type,
            estimands,
            report: IdentificationReport::new(),
            selected_method: None,
        }
    }

    pub(crate) fn set_result(&mut self, method: IdentifierMethod, estimand: Option<Estimand>) {
        self.estimands.insert(method, estimand);
    }

    pub(crate) fn report_mut(&mut self) -> &mut IdentificationReport {
        &mut self.report
    }

    pub fn treatments(&self) -> &[String] {
        &self.treatments
    }

    pub fn outcomes(&self) -> &[String] {
        &self.outcomes
    }

    pub fn estimand_type(&self) -> EstimandType {
        self.estimand_type
    }

    /// The estimand produced by `method`, if the method identified the effect.
    pub fn estimand(&self, method: IdentifierMethod) -> Option<&Estimand> {
        self.estimands.get(&method).and_then(Option::as_ref)
    }

    /// Per-method slots, all three methods always present.
    pub fn estimands(&self) -> &BTreeMap<IdentifierMethod, Option<Estimand>> {
        &self.estimands
    }

    pub fn is_identified(&self) -> bool {
        self.estimands.values().any(Option::is_some)
    }

    pub fn report(&self) -> &IdentificationReport {
        &self.report
    }

    /// Records which populated method the caller will estimate with. Selecting
    /// a method whose slot is empty is a hard error.
    pub fn set_identifier_method(
        &mut self,
        method: IdentifierMethod,
    ) -> Result<(), IdentificationError> {
        if self.estimand(method).is_none() {
            return Err(IdentificationError::MethodNotIdentified(method));
        }
        self.selected_method = Some(method);
        Ok(())
    }

    pub fn selected_method(&self) -> Option<IdentifierMethod> {
        self.selected_method
    }

    pub fn selected_estimand(&self) -> Option<&Estimand> {
        self.selected_method.and_then(|m| self.estimand(m))
    }
}

impl fmt::Display for IdentifiedEstimand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} of {{{}}} on {{{}}}",
            self.estimand_type.as_str(),
            self.treatments.join(", "),
            self.outcomes.join(", ")
        )?;
        for (method, slot) in &self.estimands {
            match slot {
                Some(estimand) => writeln!(f, "  {method}: {estimand}")?,
                None => writeln!(f, "  {method}: not identifiable")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> IdentifiedEstimand {
        let mut estimand = IdentifiedEstimand::new(
            vec!["t".into()],
            vec!["y".into()],
            EstimandType::NonparametricAte,
        );
        estimand.set_result(
            IdentifierMethod::Backdoor,
            Some(Estimand::Backdoor {
                adjustment_set: vec!["z".into()],
            }),
        );
        estimand
    }

    #[test]
    fn selecting_a_populated_method_sticks() {
        let mut estimand = populated();
        estimand
            .set_identifier_method(IdentifierMethod::Backdoor)
            .unwrap();
        assert_eq!(estimand.selected_method(), Some(IdentifierMethod::Backdoor));
        assert_eq!(
            estimand.selected_estimand().unwrap().variables(),
            &["z".to_string()]
        );
    }

    #[test]
    fn selecting_an_empty_slot_is_a_typed_error() {
        let mut estimand = populated();
        assert_eq!(
            estimand.set_identifier_method(IdentifierMethod::Iv),
            Err(IdentificationError::MethodNotIdentified(IdentifierMethod::Iv))
        );
        assert_eq!(estimand.selected_method(), None);
    }

    #[test]
    fn unknown_method_names_die_at_the_parse_boundary() {
        assert!("backdoor".parse::<IdentifierMethod>().is_ok());
        assert_eq!(
            "propensity".parse::<IdentifierMethod>(),
            Err(IdentificationError::UnknownMethod("propensity".into()))
        );
    }

    #[test]
    fn unsupported_estimand_type_is_rejected() {
        assert_eq!(
            EstimandType::parse("nonparametric-ate"),
            Ok(EstimandType::NonparametricAte)
        );
        assert!(matches!(
            EstimandType::parse("att"),
            Err(IdentificationError::UnsupportedEstimandType(_))
        ));
    }

    #[test]
    fn all_three_slots_exist_from_the_start() {
        let estimand = IdentifiedEstimand::new(
            vec!["t".into()],
            vec!["y".into()],
            EstimandType::NonparametricAte,
        );
        assert_eq!(estimand.estimands().len(), 3);
        assert!(!estimand.is_identified());
    }
}
