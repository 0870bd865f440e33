//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::NoticeSelectors;

/// Environment variable holding the webhook URL.
pub const ENV_WEBHOOK_URL: &str = "DISCORD_WEBHOOK_URL";
/// Environment variable holding the poll interval in seconds.
pub const ENV_CHECK_INTERVAL: &str = "CHECK_INTERVAL";
/// Environment variable toggling backlog suppression on the first poll.
pub const ENV_SKIP_INITIAL: &str = "SKIP_INITIAL";

/// Value written into the `.env.example` template; never a usable webhook.
pub const WEBHOOK_PLACEHOLDER: &str = "your_webhook_url_here";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and listing page settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Listing markup selectors
    #[serde(default)]
    pub selectors: NoticeSelectors,

    /// Webhook delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Polling loop settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Config load failed from {:?}: {}. Using defaults.", path, e);
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get(ENV_WEBHOOK_URL) {
            self.notify.webhook_url = Some(url);
        }

        if let Some(raw) = get(ENV_CHECK_INTERVAL) {
            self.watch.interval_secs = raw.parse().map_err(|_| {
                AppError::config(format!(
                    "{ENV_CHECK_INTERVAL} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
        }

        if let Some(raw) = get(ENV_SKIP_INITIAL) {
            self.watch.skip_initial = parse_flag(&raw).ok_or_else(|| {
                AppError::config(format!(
                    "{ENV_SKIP_INITIAL} must be true or false, got '{raw}'"
                ))
            })?;
        }

        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.webhook_url()?;

        if self.watch.interval_secs == 0 {
            return Err(AppError::validation("watch.interval_secs must be > 0"));
        }
        if self.watch.seen_file.trim().is_empty() {
            return Err(AppError::validation("watch.seen_file is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        Url::parse(&self.crawler.list_url)?;
        Url::parse(&self.crawler.base_url)?;

        for selector in [
            &self.selectors.row_selector,
            &self.selectors.link_selector,
            &self.selectors.date_selector,
        ] {
            scraper::Selector::parse(selector)
                .map_err(|e| AppError::selector(selector.as_str(), format!("{e:?}")))?;
        }
        if self.selectors.id_param.trim().is_empty() {
            return Err(AppError::validation("selectors.id_param is empty"));
        }

        Ok(())
    }

    /// The configured webhook URL, rejected if missing or still the template value.
    pub fn webhook_url(&self) -> Result<&str> {
        let url = self
            .notify
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::config(format!("{ENV_WEBHOOK_URL} is not set")))?;

        if url == WEBHOOK_PLACEHOLDER {
            return Err(AppError::config(format!(
                "{ENV_WEBHOOK_URL} still contains the template placeholder"
            )));
        }

        let parsed = Url::parse(url)
            .map_err(|e| AppError::config(format!("{ENV_WEBHOOK_URL} is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "{ENV_WEBHOOK_URL} must be an http(s) URL"
            )));
        }

        Ok(url)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// HTTP client and listing page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Notice listing page
    #[serde(default = "defaults::list_url")]
    pub list_url: String,

    /// Site origin that relative article links are joined onto
    #[serde(default = "defaults::base_url")]
    pub base_url: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            list_url: defaults::list_url(),
            base_url: defaults::base_url(),
        }
    }
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Webhook delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Discord webhook URL, usually supplied through the environment
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Footer shown under every message
    #[serde(default = "defaults::footer_text")]
    pub footer_text: String,

    /// Pause between consecutive deliveries in one batch
    #[serde(default = "defaults::delivery_delay")]
    pub delivery_delay_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            footer_text: defaults::footer_text(),
            delivery_delay_ms: defaults::delivery_delay(),
        }
    }
}

/// Polling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between polls
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Treat everything on the first successful poll as already seen
    #[serde(default = "defaults::skip_initial")]
    pub skip_initial: bool,

    /// Seen-set file, relative to the storage directory
    #[serde(default = "defaults::seen_file")]
    pub seen_file: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            skip_initial: defaults::skip_initial(),
            seen_file: defaults::seen_file(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn list_url() -> String {
        "https://maplestory.nexon.com/News/Notice".into()
    }
    pub fn base_url() -> String {
        "https://maplestory.nexon.com".into()
    }

    // Notify defaults
    pub fn footer_text() -> String {
        "메이플스토리 공지사항".into()
    }
    pub fn delivery_delay() -> u64 {
        1000
    }

    // Watch defaults
    pub fn interval() -> u64 {
        300
    }
    pub fn skip_initial() -> bool {
        true
    }
    pub fn seen_file() -> String {
        "sent_notices.json".into()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const WEBHOOK: &str = "https://discord.com/api/webhooks/1/abc";

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.notify.webhook_url = Some(WEBHOOK.to_string());
        config
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn validate_accepts_webhook_with_defaults() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_webhook() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn validate_rejects_placeholder_webhook() {
        let mut config = Config::default();
        config.notify.webhook_url = Some(WEBHOOK_PLACEHOLDER.to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_webhook() {
        let mut config = Config::default();
        config.notify.webhook_url = Some("ftp://example.com/hook".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = valid_config();
        config.watch.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_broken_selector() {
        let mut config = valid_config();
        config.selectors.row_selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            AppError::Selector { .. }
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config: Config = toml::from_str(
            r#"
            [watch]
            interval_secs = 60
            skip_initial = true
            "#,
        )
        .unwrap();

        config
            .apply_vars(vars(&[
                (ENV_WEBHOOK_URL, WEBHOOK),
                (ENV_CHECK_INTERVAL, "120"),
                (ENV_SKIP_INITIAL, "False"),
            ]))
            .unwrap();

        assert_eq!(config.notify.webhook_url.as_deref(), Some(WEBHOOK));
        assert_eq!(config.watch.interval_secs, 120);
        assert!(!config.watch.skip_initial);
    }

    #[test]
    fn env_defaults_when_unset() {
        let mut config = Config::default();
        config.apply_vars(vars(&[(ENV_CHECK_INTERVAL, "  ")])).unwrap();

        assert_eq!(config.watch.interval_secs, 300);
        assert!(config.watch.skip_initial);
        assert!(config.notify.webhook_url.is_none());
    }

    #[test]
    fn env_rejects_bad_interval() {
        let mut config = Config::default();
        let err = config
            .apply_vars(vars(&[(ENV_CHECK_INTERVAL, "five")]))
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn env_rejects_bad_flag() {
        let mut config = Config::default();
        assert!(
            config
                .apply_vars(vars(&[(ENV_SKIP_INITIAL, "maybe")]))
                .is_err()
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [notify]
            footer_text = "Notices"
            "#,
        )
        .unwrap();

        assert_eq!(config.notify.footer_text, "Notices");
        assert_eq!(config.notify.delivery_delay_ms, 1000);
        assert_eq!(config.selectors.id_param, "Oid");
        assert_eq!(config.crawler.timeout_secs, 30);
    }
}
