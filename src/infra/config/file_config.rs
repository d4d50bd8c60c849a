use serde::Deserialize;

use crate::infra::config::{AppConfig, ComposeConfig, FeedConfig, LogConfig};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub feed: Option<FileFeedConfig>,
    pub compose: Option<FileComposeConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(feed) = self.feed {
            feed.merge_into(&mut config.feed);
        }

        if let Some(compose) = self.compose {
            compose.merge_into(&mut config.compose);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileFeedConfig {
    pub page_size: Option<usize>,
    pub page_count: Option<usize>,
    pub live_items: Option<usize>,
    pub live_interval_ms: Option<u64>,
    pub fetch_delay_ms: Option<u64>,
}

impl FileFeedConfig {
    fn merge_into(self, config: &mut FeedConfig) {
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }

        if let Some(page_count) = self.page_count {
            config.page_count = page_count;
        }

        if let Some(live_items) = self.live_items {
            config.live_items = live_items;
        }

        if let Some(interval_ms) = self.live_interval_ms {
            config.live_interval_ms = interval_ms;
        }

        if let Some(delay_ms) = self.fetch_delay_ms {
            config.fetch_delay_ms = delay_ms;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileComposeConfig {
    pub author: Option<String>,
}

impl FileComposeConfig {
    fn merge_into(self, config: &mut ComposeConfig) {
        if let Some(author) = self.author {
            config.author = author;
        }
    }
}
