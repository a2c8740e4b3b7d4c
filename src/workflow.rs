//! Workflow phases and the state machine that moves a session through them.

pub mod criteria;
pub mod machine;
pub mod phase;
pub mod session;

pub use criteria::{requires_deliverable, CriterionEvaluator, CriterionTable, Gate};
pub use machine::{PhaseStateMachine, Transition, TransitionTarget};
pub use phase::{DeliverableSpec, PhaseDefinition, Workflow};
pub use session::{Artifact, PhaseExit, PhaseRecord, SessionState, WorkflowSession};
