// src/models/mod.rs

//! Domain models for the relay.

mod announcement;
mod config;
mod seen;
mod selectors;

// Re-export all public types
pub use announcement::Announcement;
pub use config::{
    Config, CrawlerConfig, ENV_CHECK_INTERVAL, ENV_SKIP_INITIAL, ENV_WEBHOOK_URL, NotifyConfig,
    WEBHOOK_PLACEHOLDER, WatchConfig,
};
pub use seen::SeenSet;
pub use selectors::NoticeSelectors;

/// Lifecycle state reported to the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    Started,
    Stopped,
}
