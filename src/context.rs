//! Agent contexts and the bounded cache that owns them.

pub mod bundle;
pub mod manager;

pub use bundle::AgentContext;
pub use manager::{CacheStats, ContextMemoryManager};
