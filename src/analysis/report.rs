//! Structured diagnostics for graph construction and identification.
//!
//! The core never logs to a global sink. Every noteworthy decision is pushed
//! onto an `IdentificationReport` that travels with the result, and the
//! caller decides what (if anything) to surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an instrument candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentRejection {
    /// Not an ancestor of any treatment.
    NotRelevant,
    /// Direct edge into an outcome.
    DirectEdgeToOutcome,
    /// Directed route to an outcome that avoids every treatment.
    UnblockedPathToOutcome,
    /// Shares a latent confounder with an outcome.
    ConfoundedWithOutcome,
}

/// One structured event emitted during construction or identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentificationEvent {
    // --- Construction ---
    /// No explicit graph was given; edges were synthesized from role sets.
    GraphSynthesizedFromRoles,
    /// The caller confirmed the "no hidden confounders" assumption through
    /// the injected callback.
    AssumedNoUnobservedConfounders,
    /// An observed dataset column missing from the graph was conservatively
    /// added as a common cause of every treatment and outcome.
    ColumnAssumedConfounder { name: String },

    // --- Backdoor search ---
    LatentConfoundersDetected { names: Vec<String> },
    /// Latent confounding present and the caller did not opt to proceed.
    BackdoorDefeatedByLatentConfounding,
    /// Latent confounding present but the caller opted to proceed; only
    /// observed adjustment sets were considered.
    ProceedingUnderCaution,
    /// The declared common-cause set already separates treatment from outcome.
    DeclaredSetSeparates { adjustment_set: Vec<String> },
    /// The subset search found a separating set.
    AdjustmentSetFound { adjustment_set: Vec<String> },
    /// No subset up to the size bound separated treatment from outcome.
    BackdoorSearchExhausted { max_size: usize },

    // --- Instrumental variables ---
    InstrumentRejected {
        name: String,
        reason: InstrumentRejection,
    },
    InstrumentsAccepted { names: Vec<String> },
    NoValidInstrument,

    // --- Front-door ---
    /// Backdoor identification succeeded, so front-door was not attempted.
    FrontdoorSkipped,
    MediatorSetFound { mediators: Vec<String> },
    FrontdoorSearchExhausted { max_size: usize },
}

impl fmt::Display for IdentificationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use IdentificationEvent::*;
        match self {
            GraphSynthesizedFromRoles => write!(f, "graph synthesized from declared role sets"),
            AssumedNoUnobservedConfounders => {
                write!(f, "caller confirmed there are no unobserved confounders")
            }
            ColumnAssumedConfounder { name } => {
                write!(f, "dataset column '{name}' absent from graph; assumed confounder")
            }
            LatentConfoundersDetected { names } => {
                write!(f, "latent confounders present: {}", names.join(", "))
            }
            BackdoorDefeatedByLatentConfounding => {
                write!(f, "backdoor identification defeated by latent confounding")
            }
            ProceedingUnderCaution => {
                write!(f, "proceeding under caution despite latent confounders")
            }
            DeclaredSetSeparates { adjustment_set } => {
                write!(f, "declared common causes suffice: {{{}}}", adjustment_set.join(", "))
            }
            AdjustmentSetFound { adjustment_set } => {
                write!(f, "adjustment set found: {{{}}}", adjustment_set.join(", "))
            }
            BackdoorSearchExhausted { max_size } => {
                write!(f, "no adjustment set of size <= {max_size} separates treatment from outcome")
            }
            InstrumentRejected { name, reason } => {
                write!(f, "instrument candidate '{name}' rejected: {reason:?}")
            }
            InstrumentsAccepted { names } => {
                write!(f, "valid instruments: {{{}}}", names.join(", "))
            }
            NoValidInstrument => write!(f, "no valid instrument"),
            FrontdoorSkipped => write!(f, "front-door not attempted (backdoor succeeded)"),
            MediatorSetFound { mediators } => {
                write!(f, "front-door mediator set found: {{{}}}", mediators.join(", "))
            }
            FrontdoorSearchExhausted { max_size } => {
                write!(f, "no mediator set of size <= {max_size} satisfies the front-door conditions")
            }
        }
    }
}

/// The ordered event log for one `identify_effect` run, seeded with any
/// events recorded while the graph was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationReport {
    events: Vec<IdentificationEvent>,
}

impl IdentificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: IdentificationEvent) {
        self.events.push(event);
    }

    pub(crate) fn extend(&mut self, events: impl IntoIterator<Item = IdentificationEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[IdentificationEvent] {
        &self.events
    }

    pub fn contains(&self, event: &IdentificationEvent) -> bool {
        self.events.contains(event)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Display for IdentificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "- {event}")?;
        }
        Ok(())
    }
}
