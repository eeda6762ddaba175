//! FFI bindings exposing the causal model, identification engine and
//! estimand to Python. String-tagged method and estimand-type names are
//! parsed (and rejected) here, at the boundary; the core only sees the
//! typed enums.

use crate::analysis::report::IdentificationReport;
use crate::graph::{CausalGraph, CausalGraphBuilder, StructuralError, Variable, VariableRole};
use crate::identify::{
    Estimand, EstimandType, IdentificationConfig, IdentificationEngine, IdentifiedEstimand,
    IdentifierMethod,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(e: StructuralError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_role(tag: &str) -> PyResult<VariableRole> {
    match tag {
        "treatment" => Ok(VariableRole::Treatment),
        "outcome" => Ok(VariableRole::Outcome),
        "common_cause" => Ok(VariableRole::CommonCause),
        "instrument" => Ok(VariableRole::Instrument),
        "effect_modifier" => Ok(VariableRole::EffectModifier),
        "unobserved_confounder" => Ok(VariableRole::UnobservedConfounder),
        "observed_other" => Ok(VariableRole::ObservedOther),
        other => Err(PyValueError::new_err(format!("unknown role tag '{other}'"))),
    }
}

/// Accumulates the graph declaration from Python, then builds and queries
/// the immutable core model. Mutating the declaration after `build` discards
/// the built snapshot; the next `build` call starts from scratch.
#[pyclass(name = "_CausalModel")]
pub struct PyCausalModel {
    treatments: Vec<String>,
    outcomes: Vec<String>,
    nodes: Vec<(String, bool, Option<String>)>,
    edges: Vec<(String, String)>,
    bidirected: Vec<(String, String)>,
    common_causes: Vec<String>,
    instruments: Vec<String>,
    effect_modifiers: Vec<String>,
    observed_columns: Option<Vec<String>>,
    missing_nodes_as_confounders: bool,
    graph: Option<CausalGraph>,
}

#[pymethods]
impl PyCausalModel {
    #[new]
    pub fn new(treatments: Vec<String>, outcomes: Vec<String>) -> Self {
        Self {
            treatments,
            outcomes,
            nodes: Vec::new(),
            edges: Vec::new(),
            bidirected: Vec::new(),
            common_causes: Vec::new(),
            instruments: Vec::new(),
            effect_modifiers: Vec::new(),
            observed_columns: None,
            missing_nodes_as_confounders: false,
            graph: None,
        }
    }

    #[pyo3(signature = (name, observed, role=None))]
    pub fn add_node(&mut self, name: String, observed: bool, role: Option<String>) -> PyResult<()> {
        if let Some(tag) = role.as_deref() {
            parse_role(tag)?;
        }
        self.nodes.push((name, observed, role));
        self.graph = None;
        Ok(())
    }

    pub fn add_edge(&mut self, from: String, to: String) {
        self.edges.push((from, to));
        self.graph = None;
    }

    pub fn add_bidirected_edge(&mut self, a: String, b: String) {
        self.bidirected.push((a, b));
        self.graph = None;
    }

    pub fn declare_common_causes(&mut self, names: Vec<String>) {
        self.common_causes.extend(names);
        self.graph = None;
    }

    pub fn declare_instruments(&mut self, names: Vec<String>) {
        self.instruments.extend(names);
        self.graph = None;
    }

    pub fn declare_effect_modifiers(&mut self, names: Vec<String>) {
        self.effect_modifiers.extend(names);
        self.graph = None;
    }

    pub fn set_observed_columns(&mut self, names: Vec<String>) {
        self.observed_columns = Some(names);
        self.graph = None;
    }

    pub fn set_missing_nodes_as_confounders(&mut self, enabled: bool) {
        self.missing_nodes_as_confounders = enabled;
        self.graph = None;
    }

    /// Builds the core graph. The Python layer runs any interactive
    /// confirmation itself and passes the verdict through
    /// `confounders_confirmed_absent`; the core never prompts.
    pub fn build(&mut self, confounders_confirmed_absent: bool) -> PyResult<()> {
        let mut builder = CausalGraphBuilder::new(self.treatments.clone(), self.outcomes.clone());
        for (name, observed, role) in &self.nodes {
            let mut variable = if *observed {
                Variable::observed(name.clone())
            } else {
                Variable::unobserved(name.clone())
            };
            if let Some(tag) = role {
                variable = variable.with_role(parse_role(tag)?);
            }
            builder = builder.node(variable);
        }
        for (from, to) in &self.edges {
            builder = builder.edge(from.clone(), to.clone());
        }
        for (a, b) in &self.bidirected {
            builder = builder.bidirected(a.clone(), b.clone());
        }
        builder = builder
            .common_causes(self.common_causes.clone())
            .instruments(self.instruments.clone())
            .effect_modifiers(self.effect_modifiers.clone())
            .missing_nodes_as_confounders(self.missing_nodes_as_confounders);
        if let Some(columns) = &self.observed_columns {
            builder = builder.observed_columns(columns.clone());
        }
        if confounders_confirmed_absent {
            builder = builder.confirm_absent_confounders(|| true);
        }

        self.graph = Some(builder.build().map_err(to_py_err)?);
        Ok(())
    }

    pub fn common_causes(&self) -> PyResult<Vec<String>> {
        self.built()?
            .common_causes_of(&self.treatments, &self.outcomes)
            .map_err(to_py_err)
    }

    pub fn instruments(&self) -> PyResult<Vec<String>> {
        self.built()?
            .instruments_for(&self.treatments, &self.outcomes)
            .map_err(to_py_err)
    }

    pub fn effect_modifiers(&self) -> PyResult<Vec<String>> {
        self.built()?
            .effect_modifiers_for(&self.treatments, &self.outcomes)
            .map_err(to_py_err)
    }

    pub fn ancestors(&self, name: String) -> PyResult<Vec<String>> {
        self.built()?.ancestors(&name).map_err(to_py_err)
    }

    pub fn descendants(&self, name: String) -> PyResult<Vec<String>> {
        self.built()?.descendants(&name).map_err(to_py_err)
    }

    pub fn node_names(&self) -> PyResult<Vec<String>> {
        Ok(self.built()?.node_names())
    }

    #[pyo3(signature = (estimand_type, proceed_when_unidentifiable, max_adjustment_size=None))]
    pub fn identify_effect(
        &self,
        estimand_type: String,
        proceed_when_unidentifiable: bool,
        max_adjustment_size: Option<usize>,
    ) -> PyResult<PyIdentifiedEstimand> {
        let graph = self.built()?;
        let estimand_type = EstimandType::parse(&estimand_type)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let config = IdentificationConfig {
            estimand_type,
            proceed_when_unidentifiable,
            max_adjustment_size,
        };
        let inner = IdentificationEngine::new(graph, config).identify_effect();
        Ok(PyIdentifiedEstimand { inner })
    }
}

impl PyCausalModel {
    fn built(&self) -> PyResult<&CausalGraph> {
        self.graph
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("graph not built; call build() first"))
    }
}

#[pyclass(name = "_IdentifiedEstimand")]
#[derive(Clone)]
pub struct PyIdentifiedEstimand {
    pub(crate) inner: IdentifiedEstimand,
}

#[pymethods]
impl PyIdentifiedEstimand {
    pub fn is_identified(&self) -> bool {
        self.inner.is_identified()
    }

    pub fn estimand_type(&self) -> &'static str {
        self.inner.estimand_type().as_str()
    }

    /// The variable set per method, keyed by method name. `None` marks a
    /// method that did not identify the effect.
    pub fn estimands(&self) -> Vec<(String, Option<Vec<String>>)> {
        self.inner
            .estimands()
            .iter()
            .map(|(method, slot)| {
                (
                    method.as_str().to_string(),
                    slot.as_ref().map(|e| e.variables().to_vec()),
                )
            })
            .collect()
    }

    pub fn backdoor_adjustment_set(&self) -> Option<Vec<String>> {
        match self.inner.estimand(IdentifierMethod::Backdoor) {
            Some(Estimand::Backdoor { adjustment_set }) => Some(adjustment_set.clone()),
            _ => None,
        }
    }

    pub fn instrument_set(&self) -> Option<Vec<String>> {
        match self.inner.estimand(IdentifierMethod::Iv) {
            Some(Estimand::InstrumentalVariable { instruments }) => Some(instruments.clone()),
            _ => None,
        }
    }

    pub fn mediator_set(&self) -> Option<Vec<String>> {
        match self.inner.estimand(IdentifierMethod::Frontdoor) {
            Some(Estimand::Frontdoor { mediators }) => Some(mediators.clone()),
            _ => None,
        }
    }

    pub fn set_identifier_method(&mut self, method: String) -> PyResult<()> {
        let method: IdentifierMethod = method
            .parse()
            .map_err(|e: crate::identify::IdentificationError| {
                PyValueError::new_err(e.to_string())
            })?;
        self.inner
            .set_identifier_method(method)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn selected_method(&self) -> Option<&'static str> {
        self.inner.selected_method().map(|m| m.as_str())
    }

    /// The structured event log as JSON, for the Python layer to render.
    pub fn report_json(&self) -> PyResult<String> {
        let report: &IdentificationReport = self.inner.report();
        serde_json::to_string(report).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    pub fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}
