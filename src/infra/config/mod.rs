mod app_config;
mod file_config;
mod loader;

pub use app_config::{AppConfig, ComposeConfig, FeedConfig, LogConfig};
pub use loader::load;
