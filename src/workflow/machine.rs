//! Phase State Machine
//!
//! Drives a [`WorkflowSession`] through the configured phases. Every
//! transition is gated: the current phase's exit criteria and required
//! deliverables, and the successor's entry criteria, must all hold. A failed
//! attempt leaves the session untouched.

use super::criteria::{check, CriterionEvaluator, Gate};
use super::phase::{PhaseDefinition, Workflow};
use super::session::{Artifact, PhaseExit, SessionState, WorkflowSession};
use crate::error::{AdvanceError, CriterionFailure, DeliverableError, StartError};
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a successful advance landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTarget {
    Phase(String),
    Completed,
}

/// Result of a successful [`PhaseStateMachine::attempt_advance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: String,
    pub to: TransitionTarget,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.to {
            TransitionTarget::Phase(phase) => write!(f, "{} -> {}", self.from, phase),
            TransitionTarget::Completed => write!(f, "{} -> completed", self.from),
        }
    }
}

pub struct PhaseStateMachine {
    workflow: Workflow,
    evaluator: Arc<dyn CriterionEvaluator>,
}

impl PhaseStateMachine {
    pub fn new(workflow: Workflow, evaluator: Arc<dyn CriterionEvaluator>) -> Self {
        Self {
            workflow,
            evaluator,
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn new_session(&self) -> WorkflowSession {
        WorkflowSession::new()
    }

    /// Definition of the session's current phase.
    pub fn current_phase<'a>(&'a self, session: &WorkflowSession) -> Option<&'a PhaseDefinition> {
        session
            .current_phase()
            .and_then(|name| self.workflow.phase(name))
    }

    /// Enter the first phase. Its entry criteria are not evaluated.
    pub fn start<'a>(
        &'a self,
        session: &mut WorkflowSession,
    ) -> Result<&'a PhaseDefinition, StartError> {
        if session.state() != &SessionState::NotStarted {
            return Err(StartError::AlreadyStarted {
                state: session.state().to_string(),
            });
        }
        let first = self
            .workflow
            .first()
            .ok_or(StartError::NoPhasesConfigured)?;
        session.enter_phase(first, Utc::now());
        info!(
            "Session {} started in phase {} (primary agent {})",
            session.session_id(),
            first.name,
            first.primary_agent
        );
        Ok(first)
    }

    /// Record an artifact for the current phase, replacing any previous one
    /// with the same name.
    pub fn record_deliverable(
        &self,
        session: &mut WorkflowSession,
        phase: &str,
        name: &str,
        artifact: Artifact,
    ) -> Result<Option<Artifact>, DeliverableError> {
        if session.current_phase() != Some(phase) {
            return Err(DeliverableError::WrongPhase {
                requested: phase.to_string(),
                current: session.current_phase().map(str::to_string),
            });
        }
        if name.trim().is_empty() {
            return Err(DeliverableError::EmptyName);
        }
        let previous = session.insert_deliverable(phase, name, artifact);
        info!(
            "Recorded deliverable {} for phase {}{}",
            name,
            phase,
            if previous.is_some() { " (replaced)" } else { "" }
        );
        Ok(previous)
    }

    /// Every gate check currently blocking the session from advancing.
    ///
    /// Does not modify the session.
    pub fn pending_criteria(
        &self,
        session: &WorkflowSession,
    ) -> Result<Vec<CriterionFailure>, AdvanceError> {
        let current = self.active_definition(session)?;
        Ok(self.blocking_failures(session, current))
    }

    /// Move to the successor phase, or to `Completed` after the last phase.
    pub fn attempt_advance(&self, session: &mut WorkflowSession) -> Result<Transition, AdvanceError> {
        let current = self.active_definition(session)?;
        let failures = self.blocking_failures(session, current);
        if !failures.is_empty() {
            warn!(
                "Phase {} cannot advance: {} checks failed",
                current.name,
                failures.len()
            );
            return Err(AdvanceError::CriteriaNotMet {
                phase: current.name.clone(),
                failures,
            });
        }

        let now = Utc::now();
        session.close_open_record(now, PhaseExit::Advanced);
        let to = match self.workflow.successor(&current.name) {
            Some(next) => {
                session.enter_phase(next, now);
                TransitionTarget::Phase(next.name.clone())
            }
            None => {
                session.finish(SessionState::Completed);
                TransitionTarget::Completed
            }
        };
        let transition = Transition {
            from: current.name.clone(),
            to,
        };
        info!("Session {} advanced: {}", session.session_id(), transition);
        Ok(transition)
    }

    /// Abort a non-terminal session. Returns `false` if it was already terminal.
    pub fn abort(&self, session: &mut WorkflowSession, reason: &str) -> bool {
        if session.is_terminal() {
            debug!(
                "Ignoring abort of terminal session {} ({})",
                session.session_id(),
                session.state()
            );
            return false;
        }
        session.close_open_record(Utc::now(), PhaseExit::Aborted);
        session.finish(SessionState::Aborted {
            reason: reason.to_string(),
        });
        info!("Session {} aborted: {}", session.session_id(), reason);
        true
    }

    fn active_definition(&self, session: &WorkflowSession) -> Result<&PhaseDefinition, AdvanceError> {
        match session.state() {
            SessionState::NotStarted => Err(AdvanceError::NotStarted),
            SessionState::Completed | SessionState::Aborted { .. } => Err(AdvanceError::Terminal {
                state: session.state().to_string(),
            }),
            SessionState::Active { phase } => {
                self.workflow
                    .phase(phase)
                    .ok_or_else(|| AdvanceError::UnknownPhase {
                        phase: phase.clone(),
                    })
            }
        }
    }

    fn blocking_failures(
        &self,
        session: &WorkflowSession,
        current: &PhaseDefinition,
    ) -> Vec<CriterionFailure> {
        let evaluator = self.evaluator.as_ref();
        let mut failures: Vec<CriterionFailure> = current
            .exit_criteria
            .iter()
            .filter_map(|criterion| check(evaluator, session, Gate::Exit, criterion))
            .collect();

        failures.extend(
            current
                .required_deliverables()
                .filter(|d| !session.has_deliverable(&current.name, &d.name))
                .map(|d| CriterionFailure::MissingDeliverable {
                    deliverable: d.name.clone(),
                }),
        );

        if let Some(next) = self.workflow.successor(&current.name) {
            failures.extend(
                next.entry_criteria
                    .iter()
                    .filter_map(|criterion| check(evaluator, session, Gate::Entry, criterion)),
            );
        }
        failures
    }
}
