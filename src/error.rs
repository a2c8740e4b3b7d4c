//! Error types for the orchestrator core.
//!
//! Each component reports its own error type so callers can tell a resolution
//! failure from a load failure from a refused transition. The facade wraps them
//! in [`OrchestratorError`] without erasing which component failed.

use crate::workflow::Gate;
use thiserror::Error;

/// Failure reported by a [`ContentStore`](crate::store::ContentStore) adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Path rejected by content store: {path} ({reason})")]
    InvalidPath { path: String, reason: String },

    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },
}

/// A reference string that does not describe a loadable resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Resource reference is empty")]
    Empty,

    #[error("Sectioned reference '{0}' has an empty file name")]
    EmptyFile(String),

    #[error("Sectioned reference '{0}' has an empty section name")]
    EmptySection(String),

    #[error("Reference '{reference}' has no recognized extension (expected one of: {expected})")]
    UnrecognizedExtension { reference: String, expected: String },
}

/// Failure resolving a reference to its content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("File not found: {file}")]
    FileNotFound { file: String },

    #[error("Section '{section}' not found in {file}")]
    SectionNotFound { file: String, section: String },

    #[error("Section '{section}' in {file} has a start marker but no end marker")]
    UnterminatedSection { file: String, section: String },

    #[error("Malformed reference: {0}")]
    MalformedReference(#[from] ReferenceError),

    #[error("Content of {file} is not valid UTF-8")]
    InvalidEncoding { file: String },

    #[error("Content store failed reading {file}: {message}")]
    Store { file: String, message: String },
}

/// One problem found while loading agent configurations.
///
/// `index` is the position of the offending entry in the input list.
/// Malformed `customize` directive; `line` is 1-based.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CustomizeParseError {
    #[error("line {line}: {directive} needs a section name")]
    MissingSection { line: usize, directive: &'static str },

    #[error("line {line}: expected '<section>:<text>' after {directive}")]
    MissingText { line: usize, directive: &'static str },

    #[error("line {line}: text after REMOVE directive")]
    TextAfterRemove { line: usize },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Agent #{index} ('{agent}'): {field} {reason}")]
    InvalidField {
        index: usize,
        agent: String,
        field: &'static str,
        reason: String,
    },

    #[error("Agent #{index} ('{agent}'): invalid {field} reference '{reference}': {source}")]
    InvalidReference {
        index: usize,
        agent: String,
        field: &'static str,
        reference: String,
        source: ReferenceError,
    },

    #[error("Agent #{index} ('{agent}'): invalid customize directives: {source}")]
    InvalidCustomize {
        index: usize,
        agent: String,
        #[source]
        source: CustomizeParseError,
    },

    #[error("Duplicate agent name '{name}' at positions {first} and {duplicate}")]
    DuplicateName {
        name: String,
        first: usize,
        duplicate: usize,
    },

    #[error("Agent '{agent}' inherits from unknown agent '{parent}'")]
    UnknownParent { agent: String, parent: String },
}

impl ValidationError {
    /// Name of the agent the error is about.
    pub fn agent(&self) -> &str {
        match self {
            ValidationError::InvalidField { agent, .. }
            | ValidationError::InvalidReference { agent, .. }
            | ValidationError::InvalidCustomize { agent, .. }
            | ValidationError::UnknownParent { agent, .. } => agent,
            ValidationError::DuplicateName { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InheritanceError {
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Circular inheritance for '{agent}': {}", .chain.join(" -> "))]
    CircularInheritance { agent: String, chain: Vec<String> },

    #[error("Agent '{agent}' inherits from unknown agent '{parent}'")]
    UnknownParent { agent: String, parent: String },
}

/// Failure building an agent context. Nothing is cached when this is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Inheritance(#[from] InheritanceError),

    #[error("Failed to load {kind} '{reference}' for agent '{agent}': {source}")]
    Resource {
        agent: String,
        kind: &'static str,
        reference: String,
        source: ResolveError,
    },

    #[error("Agent '{agent}' has invalid customize directives: {source}")]
    InvalidCustomize {
        agent: String,
        #[source]
        source: CustomizeParseError,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("No phases configured")]
    NoPhasesConfigured,

    #[error("Session already started (state: {state})")]
    AlreadyStarted { state: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliverableError {
    #[error("Cannot record deliverable for phase '{requested}': current phase is {}", .current.as_deref().unwrap_or("<none>"))]
    WrongPhase {
        requested: String,
        current: Option<String>,
    },

    #[error("Deliverable name cannot be empty")]
    EmptyName,
}

/// Why a single gate check blocked a transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CriterionFailure {
    #[error("{gate} criterion '{criterion}' not met")]
    Unmet { gate: Gate, criterion: String },

    #[error("{gate} criterion '{criterion}' could not be evaluated: {cause}")]
    EvaluationFailed {
        gate: Gate,
        criterion: String,
        cause: String,
    },

    #[error("Required deliverable '{deliverable}' has not been recorded")]
    MissingDeliverable { deliverable: String },
}

impl CriterionFailure {
    /// Criterion or deliverable name this failure refers to.
    pub fn name(&self) -> &str {
        match self {
            CriterionFailure::Unmet { criterion, .. }
            | CriterionFailure::EvaluationFailed { criterion, .. } => criterion,
            CriterionFailure::MissingDeliverable { deliverable } => deliverable,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdvanceError {
    #[error("Session has not been started")]
    NotStarted,

    #[error("Session is terminal (state: {state})")]
    Terminal { state: String },

    #[error("Session phase '{phase}' is not part of this workflow")]
    UnknownPhase { phase: String },

    #[error("Phase '{phase}' cannot advance: {} criteria not met", .failures.len())]
    CriteriaNotMet {
        phase: String,
        failures: Vec<CriterionFailure>,
    },
}

impl AdvanceError {
    /// Names of the criteria and deliverables that blocked the transition.
    pub fn failed_criteria(&self) -> Vec<&str> {
        match self {
            AdvanceError::CriteriaNotMet { failures, .. } => {
                failures.iter().map(CriterionFailure::name).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Problem with the configured phase list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowConfigError {
    #[error("Phase #{0} has an empty name")]
    EmptyPhaseName(usize),

    #[error("Duplicate phase name '{0}'")]
    DuplicatePhase(String),

    #[error("Phase '{0}' has no primary agent")]
    MissingPrimaryAgent(String),

    #[error("Phase '{phase}' has an empty criterion name")]
    EmptyCriterion { phase: String },

    #[error("Phase '{phase}' has an empty deliverable name")]
    EmptyDeliverableName { phase: String },

    #[error("Phase '{phase}' declares deliverable '{name}' more than once")]
    DuplicateDeliverable { phase: String, name: String },

    #[error("Phase '{phase}' references unknown agent '{agent}'")]
    UnknownAgent { phase: String, agent: String },
}

/// Errors surfaced by the [`Orchestrator`](crate::orchestrator::Orchestrator) facade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("Agent '{agent}' is not authorized for phase '{phase}'")]
    AgentNotAuthorizedForPhase { agent: String, phase: String },

    #[error("No phase is active (session state: {state})")]
    NoActivePhase { state: String },

    #[error("Agent configuration is invalid ({} errors)", .0.len())]
    InvalidAgents(Vec<ValidationError>),

    #[error(transparent)]
    Workflow(#[from] WorkflowConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Start(#[from] StartError),

    #[error(transparent)]
    Deliverable(#[from] DeliverableError),

    #[error(transparent)]
    Advance(#[from] AdvanceError),
}

/// Ambient setup failures: logging initialization and configuration loading.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}
