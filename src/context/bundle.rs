//! The resolved, ready-to-use bundle for one agent.

use crate::agent::{AgentDefinition, AgentRegistry, Customization};
use crate::error::LoadError;
use crate::resolver::{ResourceKind, ResourceReference, ResourceResolver};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// Persona and resources of one agent, loaded and customized.
#[derive(Debug)]
pub struct AgentContext {
    /// Inheritance-merged definition the context was built from.
    pub definition: AgentDefinition,
    /// Persona text with customize directives applied.
    pub persona_content: String,
    /// Loaded content per resource kind, in reference order.
    pub resources: BTreeMap<ResourceKind, Vec<String>>,
    /// Sum of loaded content lengths, used for cache accounting.
    pub size_bytes: usize,
    last_accessed_ms: AtomicI64,
}

impl AgentContext {
    pub fn new(
        definition: AgentDefinition,
        persona_content: String,
        resources: BTreeMap<ResourceKind, Vec<String>>,
    ) -> Self {
        let size_bytes = persona_content.len()
            + resources
                .values()
                .flat_map(|contents| contents.iter())
                .map(String::len)
                .sum::<usize>();
        Self {
            definition,
            persona_content,
            resources,
            size_bytes,
            last_accessed_ms: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    /// Resolve `name` through the registry and load everything it references.
    pub async fn build(
        name: &str,
        registry: &AgentRegistry,
        resolver: &ResourceResolver,
    ) -> Result<Self, LoadError> {
        let definition = registry.resolve_inheritance(name)?;

        let persona = resolver
            .resolve(&definition.persona_ref)
            .await
            .map_err(|source| LoadError::Resource {
                agent: definition.name.clone(),
                kind: "persona",
                reference: definition.persona_ref.to_string(),
                source,
            })?;

        let persona_content = match &definition.customize {
            Some(raw) => Customization::parse(raw)
                .map_err(|e| LoadError::InvalidCustomize {
                    agent: definition.name.clone(),
                    source: e,
                })?
                .apply(&persona),
            None => persona,
        };

        let mut resources = BTreeMap::new();
        for kind in ResourceKind::ALL {
            let loaded = try_join_all(
                definition
                    .refs(kind)
                    .iter()
                    .map(|reference| load_resource(&definition.name, kind, reference, resolver)),
            )
            .await?;
            resources.insert(kind, loaded);
        }

        let context = Self::new(definition, persona_content, resources);
        debug!(
            "Built context for agent {} ({} bytes)",
            context.definition.name, context.size_bytes
        );
        Ok(context)
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Loaded content for one resource kind.
    pub fn resources(&self, kind: ResourceKind) -> &[String] {
        self.resources
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_accessed_ms.load(Ordering::SeqCst))
            .unwrap_or_default()
    }

    pub(crate) fn touch(&self) {
        self.last_accessed_ms
            .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }
}

async fn load_resource(
    agent: &str,
    kind: ResourceKind,
    reference: &ResourceReference,
    resolver: &ResourceResolver,
) -> Result<String, LoadError> {
    resolver
        .resolve(reference)
        .await
        .map_err(|source| LoadError::Resource {
            agent: agent.to_string(),
            kind: kind.label(),
            reference: reference.to_string(),
            source,
        })
}
