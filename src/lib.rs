//! JAEGIS: Agent Configuration Resolution and Phase Orchestration
//!
//! Loads declarative agent definitions, resolves the persona and resource
//! references they carry through an injected content store, caches the
//! assembled agent contexts under a byte budget, and drives a linear phase
//! workflow whose transitions are gated by host-supplied criteria.

pub mod agent;
pub mod concurrency;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod resolver;
pub mod store;
pub mod workflow;

pub use agent::{AgentDefinition, AgentRegistry, RawAgentConfig};
pub use config::{ConfigLoader, JaegisConfig};
pub use context::{AgentContext, ContextMemoryManager};
pub use orchestrator::{Orchestrator, WorkflowStatus};
pub use resolver::{ResourceReference, ResourceResolver};
pub use store::{ContentStore, FsContentStore, MemoryContentStore};
pub use workflow::{
    Artifact, CriterionEvaluator, CriterionTable, PhaseDefinition, PhaseStateMachine, Workflow,
    WorkflowSession,
};
