//! Orchestrator Facade
//!
//! Composes the registry, resolver, context cache and phase state machine
//! around one [`WorkflowSession`]. Mutating calls take `&mut self`; wrap the
//! orchestrator in a mutex or give it a single owning task to share it. The
//! context cache may be shared between orchestrators.

use crate::agent::AgentRegistry;
use crate::config::JaegisConfig;
use crate::context::{AgentContext, ContextMemoryManager};
use crate::error::{CriterionFailure, LoadError, OrchestratorError};
use crate::resolver::ResourceResolver;
use crate::store::ContentStore;
use crate::workflow::{
    Artifact, CriterionEvaluator, PhaseDefinition, PhaseStateMachine, SessionState, Transition,
    TransitionTarget, WorkflowSession,
};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Deliverable progress of the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliverableCompleteness {
    pub phase: String,
    /// Every deliverable recorded so far, declared or not.
    pub recorded: Vec<String>,
    pub required_total: usize,
    pub required_recorded: usize,
    pub missing_required: Vec<String>,
}

impl DeliverableCompleteness {
    fn for_phase(phase: &PhaseDefinition, session: &WorkflowSession) -> Self {
        let recorded: Vec<String> = session
            .deliverables(&phase.name)
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default();
        let missing_required: Vec<String> = phase
            .required_deliverables()
            .filter(|d| !session.has_deliverable(&phase.name, &d.name))
            .map(|d| d.name.clone())
            .collect();
        let required_total = phase.required_deliverables().count();
        Self {
            phase: phase.name.clone(),
            recorded,
            required_total,
            required_recorded: required_total - missing_required.len(),
            missing_required,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Read-only snapshot returned by [`Orchestrator::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowStatus {
    pub session_id: Uuid,
    pub state: SessionState,
    pub current_phase: Option<String>,
    pub active_agent: Option<String>,
    pub deliverable_completeness: Option<DeliverableCompleteness>,
}

pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    resolver: Arc<ResourceResolver>,
    contexts: Arc<ContextMemoryManager>,
    machine: PhaseStateMachine,
    session: WorkflowSession,
}

impl Orchestrator {
    /// Compose an orchestrator with a fresh session.
    ///
    /// Fails if a phase names an agent the registry does not know.
    pub fn new(
        registry: Arc<AgentRegistry>,
        resolver: Arc<ResourceResolver>,
        contexts: Arc<ContextMemoryManager>,
        machine: PhaseStateMachine,
    ) -> Result<Self, OrchestratorError> {
        machine.workflow().validate_agents(&registry)?;
        let session = machine.new_session();
        debug!(
            "Created session {} over {} phases and {} agents",
            session.session_id(),
            machine.workflow().len(),
            registry.len()
        );
        Ok(Self {
            registry,
            resolver,
            contexts,
            machine,
            session,
        })
    }

    /// Build every component from configuration.
    pub fn from_config(
        config: &JaegisConfig,
        store: Arc<dyn ContentStore>,
        evaluator: Arc<dyn CriterionEvaluator>,
    ) -> Result<Self, OrchestratorError> {
        let registry =
            AgentRegistry::load(config.agents.clone()).map_err(OrchestratorError::InvalidAgents)?;
        let workflow = config.build_workflow()?;
        let resolver = ResourceResolver::from_config(store, &config.resolver);
        let contexts = ContextMemoryManager::new(config.context.max_bytes);
        Self::new(
            Arc::new(registry),
            Arc::new(resolver),
            Arc::new(contexts),
            PhaseStateMachine::new(workflow, evaluator),
        )
    }

    pub fn session(&self) -> &WorkflowSession {
        &self.session
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn contexts(&self) -> &Arc<ContextMemoryManager> {
        &self.contexts
    }

    pub fn current_phase(&self) -> Option<&PhaseDefinition> {
        self.machine.current_phase(&self.session)
    }

    /// Enter the first phase. Returns its name.
    pub fn start(&mut self) -> Result<String, OrchestratorError> {
        let phase = self.machine.start(&mut self.session)?;
        Ok(phase.name.clone())
    }

    /// Load (or fetch from cache) the context of an agent of the current
    /// phase and make it the active agent.
    pub async fn activate_agent(&mut self, name: &str) -> Result<Arc<AgentContext>, OrchestratorError> {
        let phase = self.active_phase()?;
        if !phase.involves(name) {
            return Err(OrchestratorError::AgentNotAuthorizedForPhase {
                agent: name.to_string(),
                phase: phase.name.clone(),
            });
        }
        let phase_name = phase.name.clone();

        let context = self
            .contexts
            .acquire(name, &self.registry, &self.resolver)
            .await?;
        self.session.set_active_agent(name);
        info!("Activated agent {} in phase {}", name, phase_name);
        Ok(context)
    }

    /// Load every agent of the current phase concurrently.
    ///
    /// Results are in phase order (primary first). One agent failing does not
    /// stop the others.
    pub async fn warm_phase(
        &self,
    ) -> Result<Vec<(String, Result<Arc<AgentContext>, LoadError>)>, OrchestratorError> {
        let phase = self.active_phase()?;
        let names: Vec<&str> = phase.agents().collect();
        let results = join_all(
            names
                .iter()
                .map(|name| self.contexts.acquire(name, &self.registry, &self.resolver)),
        )
        .await;
        debug!("Warmed {} agents for phase {}", names.len(), phase.name);
        Ok(names
            .into_iter()
            .map(str::to_string)
            .zip(results)
            .collect())
    }

    /// Record a deliverable for `phase`, which must be the current phase.
    pub fn submit_deliverable(
        &mut self,
        phase: &str,
        name: &str,
        artifact: Artifact,
    ) -> Result<Option<Artifact>, OrchestratorError> {
        Ok(self
            .machine
            .record_deliverable(&mut self.session, phase, name, artifact)?)
    }

    /// Advance to the next phase, then release the contexts of agents that
    /// are not carried into it.
    pub fn advance_phase(&mut self) -> Result<Transition, OrchestratorError> {
        let transition = self.machine.attempt_advance(&mut self.session)?;

        let carried: HashSet<&str> = match &transition.to {
            TransitionTarget::Phase(next) => self
                .machine
                .workflow()
                .phase(next)
                .map(|p| p.agents().collect())
                .unwrap_or_default(),
            TransitionTarget::Completed => HashSet::new(),
        };
        if let Some(previous) = self.machine.workflow().phase(&transition.from) {
            for agent in previous.agents().filter(|a| !carried.contains(a)) {
                self.contexts.release(agent);
            }
        }
        Ok(transition)
    }

    /// Abort the session. Returns `false` if it was already terminal.
    pub fn abort(&mut self, reason: &str) -> bool {
        self.machine.abort(&mut self.session, reason)
    }

    /// Gate checks currently blocking [`advance_phase`](Self::advance_phase).
    pub fn pending_criteria(&self) -> Result<Vec<CriterionFailure>, OrchestratorError> {
        Ok(self.machine.pending_criteria(&self.session)?)
    }

    pub fn status(&self) -> WorkflowStatus {
        WorkflowStatus {
            session_id: self.session.session_id(),
            state: self.session.state().clone(),
            current_phase: self.session.current_phase().map(str::to_string),
            active_agent: self.session.active_agent().map(str::to_string),
            deliverable_completeness: self
                .current_phase()
                .map(|phase| DeliverableCompleteness::for_phase(phase, &self.session)),
        }
    }

    fn active_phase(&self) -> Result<&PhaseDefinition, OrchestratorError> {
        self.machine
            .current_phase(&self.session)
            .ok_or_else(|| OrchestratorError::NoActivePhase {
                state: self.session.state().to_string(),
            })
    }
}
