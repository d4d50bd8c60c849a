//! Presenters for paginated, live-updating feeds and draft composition.

pub mod domain;
pub mod infra;
#[cfg(test)]
mod test_support;
pub mod ui;
pub mod usecases;
