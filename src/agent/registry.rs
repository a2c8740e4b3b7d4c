//! Agent Configuration Registry
//!
//! Holds validated agent definitions keyed by name and resolves inheritance
//! chains into merged definitions.

use super::definition::{AgentDefinition, RawAgentConfig};
use super::validation::validate_agent_config;
use crate::error::{InheritanceError, ValidationError};
use crate::resolver::{ResourceKind, ResourceResolver};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Registry of validated agent definitions.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentDefinition>,
    /// Names in load order, for deterministic listing.
    order: Vec<String>,
}

impl AgentRegistry {
    /// Validate and register a list of raw configurations.
    ///
    /// Every problem is reported, not just the first. If anything is invalid no
    /// agent is registered.
    pub fn load(raw_definitions: Vec<RawAgentConfig>) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut definitions = Vec::with_capacity(raw_definitions.len());
        let mut first_seen: HashMap<String, usize> = HashMap::new();

        for (index, raw) in raw_definitions.iter().enumerate() {
            if let Some(&first) = first_seen.get(&raw.name) {
                errors.push(ValidationError::DuplicateName {
                    name: raw.name.clone(),
                    first,
                    duplicate: index,
                });
            } else {
                first_seen.insert(raw.name.clone(), index);
            }

            match validate_agent_config(index, raw) {
                Ok(definition) => definitions.push(definition),
                Err(mut agent_errors) => errors.append(&mut agent_errors),
            }
        }

        for definition in &definitions {
            if let Some(parent) = &definition.inherits_from {
                if !first_seen.contains_key(parent) {
                    errors.push(ValidationError::UnknownParent {
                        agent: definition.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        if !errors.is_empty() {
            warn!(
                "Rejected agent configuration: {} errors across {} entries",
                errors.len(),
                raw_definitions.len()
            );
            return Err(errors);
        }

        let mut registry = AgentRegistry::default();
        for definition in definitions {
            registry.order.push(definition.name.clone());
            registry.agents.insert(definition.name.clone(), definition);
        }
        info!("Loaded {} agent definitions", registry.len());
        Ok(registry)
    }

    /// Get an agent definition by name, as configured (not inheritance-merged).
    pub fn get(&self, name: &str) -> Option<&AgentDefinition> {
        self.agents.get(name)
    }

    /// Like [`get`](Self::get), failing with `AgentNotFound`.
    pub fn get_or_error(&self, name: &str) -> Result<&AgentDefinition, InheritanceError> {
        self.get(name)
            .ok_or_else(|| InheritanceError::AgentNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// All definitions in load order.
    pub fn list_all(&self) -> Vec<&AgentDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.agents.get(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Resolve the `inherits_from` chain of `name` into one merged definition.
    ///
    /// The chain is merged root-first. A name appearing twice in the chain is a
    /// cycle and fails with `CircularInheritance`.
    pub fn resolve_inheritance(&self, name: &str) -> Result<AgentDefinition, InheritanceError> {
        let start = self.get_or_error(name)?;

        let mut chain = vec![start.name.clone()];
        let mut lineage = vec![start];
        let mut current = start;
        while let Some(parent_name) = &current.inherits_from {
            if chain.contains(parent_name) {
                chain.push(parent_name.clone());
                warn!("Circular inheritance detected: {}", chain.join(" -> "));
                return Err(InheritanceError::CircularInheritance {
                    agent: name.to_string(),
                    chain,
                });
            }
            let parent = self
                .get(parent_name)
                .ok_or_else(|| InheritanceError::UnknownParent {
                    agent: current.name.clone(),
                    parent: parent_name.clone(),
                })?;
            chain.push(parent_name.clone());
            lineage.push(parent);
            current = parent;
        }

        debug!("Resolved inheritance chain: {}", chain.join(" -> "));
        let mut merged: Option<AgentDefinition> = None;
        for definition in lineage.into_iter().rev() {
            merged = Some(match merged {
                None => definition.clone(),
                Some(parent) => definition.merge_with_parent(&parent),
            });
        }
        merged.ok_or_else(|| InheritanceError::AgentNotFound(name.to_string()))
    }

    /// Resolve every reference of an agent and report which ones load.
    ///
    /// Lets a host surface broken references before a phase needs the agent.
    pub async fn verify_references(
        &self,
        name: &str,
        resolver: &ResourceResolver,
    ) -> Result<ReferenceReport, InheritanceError> {
        let definition = self.resolve_inheritance(name)?;
        let mut report = ReferenceReport::new(name.to_string());

        match resolver.resolve(&definition.persona_ref).await {
            Ok(_) => report.add_check(&format!("persona {}", definition.persona_ref), true),
            Err(e) => report.add_error(format!("persona {}: {}", definition.persona_ref, e)),
        }

        for kind in ResourceKind::ALL {
            for reference in definition.refs(kind) {
                match resolver.resolve(reference).await {
                    Ok(_) => report.add_check(&format!("{} {}", kind, reference), true),
                    Err(e) => report.add_error(format!("{} {}: {}", kind, reference, e)),
                }
            }
        }
        Ok(report)
    }
}

/// Outcome of checking an agent's references against the content store.
#[derive(Debug, Clone)]
pub struct ReferenceReport {
    pub agent: String,
    pub checks: Vec<(String, bool)>,
    pub errors: Vec<String>,
}

impl ReferenceReport {
    pub fn new(agent: String) -> Self {
        Self {
            agent,
            checks: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn add_check(&mut self, description: &str, passed: bool) {
        self.checks.push((description.to_string(), passed));
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.checks.iter().all(|(_, passed)| *passed)
    }

    pub fn total_checks(&self) -> usize {
        self.checks.len() + self.errors.len()
    }

    pub fn passed_checks(&self) -> usize {
        self.checks.iter().filter(|(_, passed)| *passed).count()
    }
}
