//! Infrastructure layer: config, logging and in-memory collaborators.

pub mod config;
pub mod error;
pub mod in_memory;
pub mod logging;

/// Returns the infra module name for smoke checks.
pub fn module_name() -> &'static str {
    "infra"
}
