//! Criterion evaluation.
//!
//! Criteria are opaque names attached to phases. Whether one holds is decided
//! by a host-supplied [`CriterionEvaluator`]. Evaluation fails closed: an
//! evaluator error or panic blocks the transition.

use super::session::WorkflowSession;
use crate::error::CriterionFailure;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// Which side of a phase a criterion guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Entry,
    Exit,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Entry => write!(f, "entry"),
            Gate::Exit => write!(f, "exit"),
        }
    }
}

/// Decides whether a named criterion holds for a session.
pub trait CriterionEvaluator: Send + Sync {
    fn evaluate(&self, session: &WorkflowSession, criterion: &str) -> Result<bool, String>;
}

impl<F> CriterionEvaluator for F
where
    F: Fn(&WorkflowSession, &str) -> Result<bool, String> + Send + Sync,
{
    fn evaluate(&self, session: &WorkflowSession, criterion: &str) -> Result<bool, String> {
        self(session, criterion)
    }
}

type Predicate = Box<dyn Fn(&WorkflowSession) -> Result<bool, String> + Send + Sync>;

/// Evaluator backed by a table of per-criterion predicates.
///
/// Criteria without an entry fail to evaluate.
#[derive(Default)]
pub struct CriterionTable {
    predicates: HashMap<String, Predicate>,
}

impl CriterionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, criterion: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&WorkflowSession) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.insert(criterion, predicate);
        self
    }

    pub fn insert<F>(&mut self, criterion: impl Into<String>, predicate: F)
    where
        F: Fn(&WorkflowSession) -> Result<bool, String> + Send + Sync + 'static,
    {
        self.predicates.insert(criterion.into(), Box::new(predicate));
    }

    /// Register a criterion that always evaluates to `value`.
    pub fn with_constant(self, criterion: impl Into<String>, value: bool) -> Self {
        self.with(criterion, move |_| Ok(value))
    }

    pub fn contains(&self, criterion: &str) -> bool {
        self.predicates.contains_key(criterion)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl CriterionEvaluator for CriterionTable {
    fn evaluate(&self, session: &WorkflowSession, criterion: &str) -> Result<bool, String> {
        match self.predicates.get(criterion) {
            Some(predicate) => predicate(session),
            None => Err(format!("no evaluator registered for '{}'", criterion)),
        }
    }
}

impl fmt::Debug for CriterionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("CriterionTable")
            .field("criteria", &names)
            .finish()
    }
}

/// Predicate that holds once `deliverable` is recorded for `phase`.
pub fn requires_deliverable(
    phase: impl Into<String>,
    deliverable: impl Into<String>,
) -> impl Fn(&WorkflowSession) -> Result<bool, String> + Send + Sync + 'static {
    let phase = phase.into();
    let deliverable = deliverable.into();
    move |session: &WorkflowSession| Ok(session.has_deliverable(&phase, &deliverable))
}

/// Evaluate one criterion, converting errors and panics into failures.
///
/// Returns `None` when the criterion holds.
pub(crate) fn check(
    evaluator: &dyn CriterionEvaluator,
    session: &WorkflowSession,
    gate: Gate,
    criterion: &str,
) -> Option<CriterionFailure> {
    let outcome = catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(session, criterion)))
        .unwrap_or_else(|payload| Err(format!("evaluator panicked: {}", panic_message(&*payload))));

    match outcome {
        Ok(true) => None,
        Ok(false) => {
            warn!("{} criterion '{}' not met", gate, criterion);
            Some(CriterionFailure::Unmet {
                gate,
                criterion: criterion.to_string(),
            })
        }
        Err(cause) => {
            warn!(
                "{} criterion '{}' could not be evaluated: {}",
                gate, criterion, cause
            );
            Some(CriterionFailure::EvaluationFailed {
                gate,
                criterion: criterion.to_string(),
                cause,
            })
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
