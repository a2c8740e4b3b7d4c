//! Integration tests for the JAEGIS orchestration core

mod config_loading;
mod context_cache;
mod inheritance;
mod resolver_scenarios;
mod support;
mod workflow_scenarios;
