//! Presenters and the contracts they are wired through.

pub mod bootstrap;
pub mod cached_compose;
pub mod context;
pub mod contracts;
pub mod draft_cache;
pub mod gated_feed;
pub mod lifecycle;
pub mod local_compose;
pub mod paged_feed;
pub mod schedulers;
pub mod streams;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
