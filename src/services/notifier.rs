// src/services/notifier.rs

//! Discord webhook notifier.
//!
//! Every message is a single embed. Discord answers `204 No Content` when it
//! accepts a webhook execution; anything else counts as a failed delivery.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::{Announcement, BotStatus, Config};

/// Embed colour for new announcements (blue).
pub const COLOR_ANNOUNCEMENT: u32 = 5_814_783;
/// Embed colour for the started status (green).
pub const COLOR_STARTED: u32 = 3_066_993;
/// Embed colour for the stopped status (red).
pub const COLOR_STOPPED: u32 = 15_158_332;

/// Discord rejects embed titles with more characters than this.
const MAX_TITLE_LEN: usize = 256;

/// Delivers announcements and lifecycle messages somewhere.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one announcement. `Ok` means the endpoint confirmed receipt.
    async fn send_announcement(&self, announcement: &Announcement) -> Result<()>;

    /// Deliver a lifecycle status message.
    async fn send_status(&self, status: BotStatus) -> Result<()>;
}

/// Notifier posting embeds to a Discord webhook.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
    footer_text: String,
    poll_interval: Duration,
}

impl WebhookNotifier {
    pub fn new(
        client: Client,
        webhook_url: impl Into<String>,
        footer_text: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            footer_text: footer_text.into(),
            poll_interval,
        }
    }

    /// Build the notifier from a validated configuration.
    pub fn from_config(config: &Config, client: Client) -> Result<Self> {
        Ok(Self::new(
            client,
            config.webhook_url()?,
            config.notify.footer_text.clone(),
            Duration::from_secs(config.watch.interval_secs),
        ))
    }

    async fn post(&self, payload: &WebhookPayload) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::Webhook {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_announcement(&self, announcement: &Announcement) -> Result<()> {
        let payload = WebhookPayload::single(Embed::announcement(
            announcement,
            &self.footer_text,
            Utc::now(),
        ));
        self.post(&payload).await?;
        log::info!("Delivered announcement {}: {}", announcement.id, announcement.title);
        Ok(())
    }

    async fn send_status(&self, status: BotStatus) -> Result<()> {
        let payload = WebhookPayload::single(Embed::status(
            status,
            self.poll_interval,
            &self.footer_text,
            Local::now(),
        ));
        self.post(&payload).await?;
        log::info!("Delivered status message: {:?}", status);
        Ok(())
    }
}

/// Body of a webhook execution request.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub embeds: Vec<Embed>,
}

impl WebhookPayload {
    pub fn single(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
        }
    }
}

/// A Discord embed.
#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl Embed {
    /// Embed announcing a newly published notice.
    pub fn announcement(announcement: &Announcement, footer: &str, now: DateTime<Utc>) -> Self {
        let date = if announcement.date.is_empty() {
            "-".to_string()
        } else {
            announcement.date.clone()
        };

        Self {
            title: truncate_title(&announcement.title, MAX_TITLE_LEN),
            url: Some(announcement.url.clone()),
            description: None,
            color: COLOR_ANNOUNCEMENT,
            fields: vec![EmbedField {
                name: "작성일".to_string(),
                value: date,
                inline: true,
            }],
            footer: EmbedFooter {
                text: footer.to_string(),
            },
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Embed reporting that the relay started or stopped.
    pub fn status(
        status: BotStatus,
        poll_interval: Duration,
        footer: &str,
        now: DateTime<Local>,
    ) -> Self {
        let (title, description, color) = match status {
            BotStatus::Started => (
                "🟢 공지사항 알림봇 시작",
                "새 공지사항 모니터링을 시작합니다.",
                COLOR_STARTED,
            ),
            BotStatus::Stopped => (
                "🔴 공지사항 알림봇 종료",
                "공지사항 모니터링을 종료합니다.",
                COLOR_STOPPED,
            ),
        };

        let secs = poll_interval.as_secs();
        Self {
            title: title.to_string(),
            url: None,
            description: Some(description.to_string()),
            color,
            fields: vec![
                EmbedField {
                    name: "서버 시간".to_string(),
                    value: now.format("%Y-%m-%d %H:%M:%S").to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "체크 간격".to_string(),
                    value: format!("{}초 ({}분)", secs, secs / 60),
                    inline: true,
                },
            ],
            footer: EmbedFooter {
                text: footer.to_string(),
            },
            timestamp: now
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Cut `text` to at most `max` chars, marking the cut with an ellipsis.
///
/// The limit counts chars; the cut only falls between grapheme clusters.
fn truncate_title(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for grapheme in text.graphemes(true) {
        let len = grapheme.chars().count();
        if used + len > budget {
            break;
        }
        used += len;
        out.push_str(grapheme);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn sample_announcement() -> Announcement {
        Announcement {
            id: "104".to_string(),
            title: "신규 공지".to_string(),
            url: "https://maplestory.nexon.com/News/Notice/Article?Oid=104".to_string(),
            date: "2026.10.16".to_string(),
        }
    }

    fn fixed_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_announcement_payload_shape() {
        let payload =
            WebhookPayload::single(Embed::announcement(&sample_announcement(), "Footer", fixed_utc()));
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            value,
            json!({
                "embeds": [{
                    "title": "신규 공지",
                    "url": "https://maplestory.nexon.com/News/Notice/Article?Oid=104",
                    "color": 5814783,
                    "fields": [{ "name": "작성일", "value": "2026.10.16", "inline": true }],
                    "footer": { "text": "Footer" },
                    "timestamp": "2026-10-16T09:30:00Z"
                }]
            })
        );
    }

    #[test]
    fn test_empty_date_is_placeholder() {
        let mut announcement = sample_announcement();
        announcement.date.clear();
        let embed = Embed::announcement(&announcement, "Footer", fixed_utc());
        assert_eq!(embed.fields[0].value, "-");
    }

    #[test]
    fn test_status_payload_colors_and_fields() {
        let now = Local.with_ymd_and_hms(2026, 10, 16, 18, 0, 0).unwrap();
        let started = Embed::status(BotStatus::Started, Duration::from_secs(300), "F", now);
        let stopped = Embed::status(BotStatus::Stopped, Duration::from_secs(300), "F", now);

        assert_eq!(started.color, COLOR_STARTED);
        assert_eq!(stopped.color, COLOR_STOPPED);
        assert_eq!(started.fields[0].value, "2026-10-16 18:00:00");
        assert_eq!(started.fields[1].value, "300초 (5분)");

        let value: Value = serde_json::to_value(&stopped).unwrap();
        assert!(value.get("url").is_none());
        assert!(value["description"].is_string());
    }

    #[test]
    fn test_long_title_is_truncated() {
        let mut announcement = sample_announcement();
        announcement.title = "가".repeat(300);
        let embed = Embed::announcement(&announcement, "Footer", fixed_utc());
        assert_eq!(embed.title.chars().count(), MAX_TITLE_LEN);
        assert!(embed.title.ends_with('…'));
    }

    #[test]
    fn test_short_title_is_untouched() {
        assert_eq!(truncate_title("abc", 3), "abc");
    }

    #[test]
    fn test_truncation_counts_chars_of_decomposed_hangul() {
        // Each syllable is one grapheme built from two jamo chars.
        let title = "\u{1100}\u{1161}".repeat(200);
        let cut = truncate_title(&title, MAX_TITLE_LEN);

        assert!(cut.chars().count() <= MAX_TITLE_LEN);
        assert!(cut.ends_with('…'));
        let body = cut.trim_end_matches('…');
        assert_eq!(body.chars().count() % 2, 0);
        assert!(body.graphemes(true).all(|g| g == "\u{1100}\u{1161}"));
    }

    #[test]
    fn test_truncation_keeps_zwj_emoji_whole() {
        let family = "👨\u{200d}👩\u{200d}👧";
        let title = format!("{}{}", "a".repeat(250), family);
        let cut = truncate_title(&title, 254);

        assert_eq!(cut, format!("{}…", "a".repeat(250)));
    }

    fn notifier_for(url: impl Into<String>) -> WebhookNotifier {
        WebhookNotifier::new(Client::new(), url, "Footer", Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_no_content_reply_is_delivered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = notifier_for(format!("{}/hook", server.uri()));
        notifier
            .send_announcement(&sample_announcement())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ok_with_body_is_not_delivered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200).set_body_string("queued"))
            .mount(&server)
            .await;

        let notifier = notifier_for(format!("{}/hook", server.uri()));
        let err = notifier
            .send_announcement(&sample_announcement())
            .await
            .unwrap_err();
        match err {
            AppError::Webhook { status, body } => {
                assert_eq!(status, 200);
                assert_eq!(body, "queued");
            }
            other => panic!("expected webhook error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_status_message_rejected_by_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let notifier = notifier_for(server.uri());
        let err = notifier.send_status(BotStatus::Started).await.unwrap_err();
        assert!(matches!(err, AppError::Webhook { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_transport_error() {
        // Bind then release a port so nothing is listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        drop(listener);

        let err = notifier_for(url)
            .send_announcement(&sample_announcement())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Http(_)));
    }
}
