//! UI layer: console rendering of presenter effects.

mod console_view;

pub use console_view::{ConsoleView, FeedLine};

/// Returns the UI module name for smoke checks.
pub fn module_name() -> &'static str {
    "ui"
}
