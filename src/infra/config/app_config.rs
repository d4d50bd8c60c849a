use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub feed: FeedConfig,
    pub compose: ComposeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

/// Shape and pacing of the in-memory feed served by the demo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    pub page_size: usize,
    pub page_count: usize,
    pub live_items: usize,
    pub live_interval_ms: u64,
    pub fetch_delay_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            page_count: 3,
            live_items: 3,
            live_interval_ms: 250,
            fetch_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComposeConfig {
    pub author: String,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            author: "me".to_owned(),
        }
    }
}
