//! Agent definition shapes: raw configuration input and the validated definition.

use crate::resolver::{ResourceKind, ResourceReference};
use serde::{Deserialize, Serialize};

/// Agent configuration as it arrives from the host, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAgentConfig {
    pub title: String,
    pub name: String,
    pub description: String,
    /// Persona reference, e.g. `personas#pm`.
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub customize: Option<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub checklists: Vec<String>,
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default)]
    pub inherits_from: Option<String>,
}

/// Validated identity record for one orchestrable agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub title: String,
    pub name: String,
    pub description: String,
    pub persona_ref: ResourceReference,
    pub customize: Option<String>,
    pub task_refs: Vec<ResourceReference>,
    pub template_refs: Vec<ResourceReference>,
    pub checklist_refs: Vec<ResourceReference>,
    pub data_refs: Vec<ResourceReference>,
    pub inherits_from: Option<String>,
}

impl AgentDefinition {
    /// References of the given kind, in configuration order.
    pub fn refs(&self, kind: ResourceKind) -> &[ResourceReference] {
        match kind {
            ResourceKind::Task => &self.task_refs,
            ResourceKind::Template => &self.template_refs,
            ResourceKind::Checklist => &self.checklist_refs,
            ResourceKind::Data => &self.data_refs,
        }
    }

    /// Derive a definition from `parent` overridden by `self`.
    ///
    /// Scalars come from `self`; `customize` falls back to the parent's.
    /// Reference lists are the parent's followed by the child's new entries,
    /// without duplicates. Merging the result with the same parent again, or
    /// with itself, yields the same definition.
    pub fn merge_with_parent(&self, parent: &AgentDefinition) -> AgentDefinition {
        AgentDefinition {
            title: self.title.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            persona_ref: self.persona_ref.clone(),
            customize: self.customize.clone().or_else(|| parent.customize.clone()),
            task_refs: union_refs(&parent.task_refs, &self.task_refs),
            template_refs: union_refs(&parent.template_refs, &self.template_refs),
            checklist_refs: union_refs(&parent.checklist_refs, &self.checklist_refs),
            data_refs: union_refs(&parent.data_refs, &self.data_refs),
            inherits_from: self.inherits_from.clone(),
        }
    }
}

fn union_refs(parent: &[ResourceReference], child: &[ResourceReference]) -> Vec<ResourceReference> {
    let mut merged: Vec<ResourceReference> = Vec::with_capacity(parent.len() + child.len());
    for reference in parent.iter().chain(child.iter()) {
        if !merged.contains(reference) {
            merged.push(reference.clone());
        }
    }
    merged
}
