//! Agent configuration: definitions, validation, customization, and the registry.

pub mod customize;
pub mod definition;
pub mod registry;
pub mod validation;

pub use customize::{Customization, CustomizeDirective};
pub use definition::{AgentDefinition, RawAgentConfig};
pub use registry::{AgentRegistry, ReferenceReport};
pub use validation::{validate_agent_config, validate_agent_name};
