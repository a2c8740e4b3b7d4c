//! Source composition for [`JaegisConfig`](super::JaegisConfig).

pub mod merge_policy;
pub mod service;
