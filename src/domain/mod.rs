//! Domain layer: feed entities, drafts and paging state.

pub mod draft;
pub mod message;
pub mod page_gate;
pub mod post;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
