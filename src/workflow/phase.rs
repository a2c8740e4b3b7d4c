//! Phase definitions and the ordered workflow they form.

use crate::agent::AgentRegistry;
use crate::error::WorkflowConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Output a phase is expected to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Required deliverables must be recorded before the phase can be left.
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

impl DeliverableSpec {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: false,
        }
    }
}

/// One stage of the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub name: String,
    pub primary_agent: String,
    #[serde(default)]
    pub supporting_agents: Vec<String>,
    #[serde(default)]
    pub entry_criteria: Vec<String>,
    #[serde(default)]
    pub exit_criteria: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<DeliverableSpec>,
}

impl PhaseDefinition {
    pub fn new(name: impl Into<String>, primary_agent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_agent: primary_agent.into(),
            supporting_agents: Vec::new(),
            entry_criteria: Vec::new(),
            exit_criteria: Vec::new(),
            deliverables: Vec::new(),
        }
    }

    pub fn with_supporting_agent(mut self, agent: impl Into<String>) -> Self {
        self.supporting_agents.push(agent.into());
        self
    }

    pub fn with_entry_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.entry_criteria.push(criterion.into());
        self
    }

    pub fn with_exit_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.exit_criteria.push(criterion.into());
        self
    }

    pub fn with_deliverable(mut self, deliverable: DeliverableSpec) -> Self {
        self.deliverables.push(deliverable);
        self
    }

    /// Primary agent followed by supporting agents.
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_agent.as_str())
            .chain(self.supporting_agents.iter().map(String::as_str))
    }

    /// Whether `agent` may act during this phase.
    pub fn involves(&self, agent: &str) -> bool {
        self.agents().any(|a| a == agent)
    }

    pub fn required_deliverables(&self) -> impl Iterator<Item = &DeliverableSpec> {
        self.deliverables.iter().filter(|d| d.required)
    }
}

/// Validated, totally ordered list of phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workflow {
    phases: Vec<PhaseDefinition>,
}

impl Workflow {
    pub fn new(phases: Vec<PhaseDefinition>) -> Result<Self, WorkflowConfigError> {
        let mut names = HashSet::new();
        for (index, phase) in phases.iter().enumerate() {
            if phase.name.trim().is_empty() {
                return Err(WorkflowConfigError::EmptyPhaseName(index));
            }
            if !names.insert(phase.name.as_str()) {
                return Err(WorkflowConfigError::DuplicatePhase(phase.name.clone()));
            }
            if phase.primary_agent.trim().is_empty() {
                return Err(WorkflowConfigError::MissingPrimaryAgent(phase.name.clone()));
            }
            if phase
                .entry_criteria
                .iter()
                .chain(phase.exit_criteria.iter())
                .any(|c| c.trim().is_empty())
            {
                return Err(WorkflowConfigError::EmptyCriterion {
                    phase: phase.name.clone(),
                });
            }
            let mut deliverables = HashSet::new();
            for deliverable in &phase.deliverables {
                if deliverable.name.trim().is_empty() {
                    return Err(WorkflowConfigError::EmptyDeliverableName {
                        phase: phase.name.clone(),
                    });
                }
                if !deliverables.insert(&deliverable.name) {
                    return Err(WorkflowConfigError::DuplicateDeliverable {
                        phase: phase.name.clone(),
                        name: deliverable.name.clone(),
                    });
                }
            }
        }
        Ok(Self { phases })
    }

    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn first(&self) -> Option<&PhaseDefinition> {
        self.phases.first()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.name == name)
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseDefinition> {
        self.phases.iter().find(|p| p.name == name)
    }

    /// The phase configured after `name`, if any.
    pub fn successor(&self, name: &str) -> Option<&PhaseDefinition> {
        self.index_of(name).and_then(|i| self.phases.get(i + 1))
    }

    /// Check that every agent named by a phase is registered.
    pub fn validate_agents(&self, registry: &AgentRegistry) -> Result<(), WorkflowConfigError> {
        for phase in &self.phases {
            if let Some(agent) = phase.agents().find(|a| !registry.contains(a)) {
                return Err(WorkflowConfigError::UnknownAgent {
                    phase: phase.name.clone(),
                    agent: agent.to_string(),
                });
            }
        }
        Ok(())
    }
}
