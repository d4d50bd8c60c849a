use std::path::Path;

use crate::{
    infra::{self, config, error::AppError},
    usecases::context::AppContext,
};

/// Loads config and installs logging. Call once per process.
pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let context = build_context(config_path)?;
    infra::logging::init(&context.config.logging)?;

    Ok(context)
}

fn build_context(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = config::load(config_path)?;

    Ok(AppContext::new(config))
}
