//! Workflow session state.
//!
//! A session is mutated only by the [`PhaseStateMachine`](super::PhaseStateMachine);
//! callers read it through accessors. Mutating calls must be serialized by the
//! owner of the session.

use super::phase::PhaseDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Active { phase: String },
    Completed,
    Aborted { reason: String },
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Aborted { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not started"),
            SessionState::Active { phase } => write!(f, "active in {}", phase),
            SessionState::Completed => write!(f, "completed"),
            SessionState::Aborted { reason } => write!(f, "aborted ({})", reason),
        }
    }
}

/// How a phase was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseExit {
    Advanced,
    Aborted,
}

/// One visit to a phase. Open (no `exited_at`) while the phase is current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: String,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub exit: Option<PhaseExit>,
}

impl PhaseRecord {
    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }
}

/// Output recorded against a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub content: String,
    pub produced_by: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            produced_by: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn produced_by(mut self, agent: impl Into<String>) -> Self {
        self.produced_by = Some(agent.into());
        self
    }
}

/// Top-level mutable state of one orchestration run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSession {
    session_id: Uuid,
    state: SessionState,
    phase_history: Vec<PhaseRecord>,
    deliverables: BTreeMap<String, BTreeMap<String, Artifact>>,
    active_agent: Option<String>,
}

impl WorkflowSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: SessionState::NotStarted,
            phase_history: Vec::new(),
            deliverables: BTreeMap::new(),
            active_agent: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Name of the active phase, if the session is in one.
    pub fn current_phase(&self) -> Option<&str> {
        match &self.state {
            SessionState::Active { phase } => Some(phase),
            _ => None,
        }
    }

    pub fn phase_history(&self) -> &[PhaseRecord] {
        &self.phase_history
    }

    pub fn active_agent(&self) -> Option<&str> {
        self.active_agent.as_deref()
    }

    pub fn deliverables(&self, phase: &str) -> Option<&BTreeMap<String, Artifact>> {
        self.deliverables.get(phase)
    }

    pub fn deliverable(&self, phase: &str, name: &str) -> Option<&Artifact> {
        self.deliverables.get(phase).and_then(|d| d.get(name))
    }

    pub fn has_deliverable(&self, phase: &str, name: &str) -> bool {
        self.deliverable(phase, name).is_some()
    }

    pub(crate) fn enter_phase(&mut self, phase: &PhaseDefinition, at: DateTime<Utc>) {
        self.phase_history.push(PhaseRecord {
            phase: phase.name.clone(),
            entered_at: at,
            exited_at: None,
            exit: None,
        });
        self.state = SessionState::Active {
            phase: phase.name.clone(),
        };
        self.active_agent = Some(phase.primary_agent.clone());
    }

    pub(crate) fn close_open_record(&mut self, at: DateTime<Utc>, exit: PhaseExit) {
        if let Some(record) = self.phase_history.last_mut().filter(|r| r.is_open()) {
            record.exited_at = Some(at);
            record.exit = Some(exit);
        }
    }

    pub(crate) fn finish(&mut self, state: SessionState) {
        self.state = state;
        self.active_agent = None;
    }

    pub(crate) fn insert_deliverable(
        &mut self,
        phase: &str,
        name: &str,
        artifact: Artifact,
    ) -> Option<Artifact> {
        self.deliverables
            .entry(phase.to_string())
            .or_default()
            .insert(name.to_string(), artifact)
    }

    pub(crate) fn set_active_agent(&mut self, agent: &str) {
        self.active_agent = Some(agent.to_string());
    }
}

impl Default for WorkflowSession {
    fn default() -> Self {
        Self::new()
    }
}
