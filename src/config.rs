//! Configuration
//!
//! Layered configuration: built-in defaults, then the global config file,
//! then the workspace `jaegis.{toml,yaml}`, then `JAEGIS__*` environment
//! variables. Agents and phases are usually declared in the workspace file.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::agent::RawAgentConfig;
use crate::error::{ConfigurationError, WorkflowConfigError};
use crate::logging::LoggingConfig;
use crate::resolver::SectionMarkers;
use crate::store::FsContentStore;
use crate::workflow::{PhaseDefinition, Workflow};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default context cache budget: 8 MiB.
pub const DEFAULT_MAX_CONTEXT_BYTES: usize = 8 * 1024 * 1024;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JaegisConfig {
    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub agents: Vec<RawAgentConfig>,

    #[serde(default)]
    pub phases: Vec<PhaseDefinition>,
}

impl JaegisConfig {
    /// Validate the configured phases into an ordered [`Workflow`].
    pub fn build_workflow(&self) -> Result<Workflow, WorkflowConfigError> {
        Workflow::new(self.phases.clone())
    }

    /// Filesystem store rooted at `resolver.content_root`, relative paths
    /// taken from `base_dir`. `None` when no root is configured.
    pub fn content_store(&self, base_dir: &Path) -> Result<Option<FsContentStore>, ConfigurationError> {
        self.resolver
            .content_root
            .as_deref()
            .map(|root| FsContentStore::from_root_spec(root, base_dir))
            .transpose()
    }
}

/// Context cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Byte budget for cached agent contexts
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_CONTEXT_BYTES
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

/// Resource resolution settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Section marker keywords (`begin_keyword`, `end_keyword`)
    #[serde(flatten)]
    pub markers: SectionMarkers,

    /// Extension tried for sectioned files named without one; empty disables
    #[serde(default = "default_bundle_extension")]
    pub bundle_extension: Option<String>,

    /// Directory content references are read from (absolute, `~/`, or
    /// relative to the workspace)
    #[serde(default)]
    pub content_root: Option<String>,
}

fn default_bundle_extension() -> Option<String> {
    Some("txt".to_string())
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            markers: SectionMarkers::default(),
            bundle_extension: default_bundle_extension(),
            content_root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JaegisConfig::default();
        assert_eq!(config.context.max_bytes, DEFAULT_MAX_CONTEXT_BYTES);
        assert_eq!(config.resolver.markers.begin_keyword, "START");
        assert_eq!(config.resolver.bundle_extension.as_deref(), Some("txt"));
        assert!(config.agents.is_empty());
        assert!(config.build_workflow().unwrap().is_empty());
    }

    #[test]
    fn test_build_workflow_rejects_duplicates() {
        let config = JaegisConfig {
            phases: vec![
                PhaseDefinition::new("Modeling", "john"),
                PhaseDefinition::new("Modeling", "john"),
            ],
            ..Default::default()
        };
        assert!(matches!(
            config.build_workflow(),
            Err(WorkflowConfigError::DuplicatePhase(_))
        ));
    }

    #[test]
    fn test_content_store_relative_to_base() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = JaegisConfig::default();
        assert!(config.content_store(temp.path()).unwrap().is_none());

        config.resolver.content_root = Some("content".to_string());
        let store = config.content_store(temp.path()).unwrap().unwrap();
        assert_eq!(store.root(), temp.path().join("content"));
    }
}
