//! Service layer for the relay.
//!
//! This module contains the business logic for:
//! - Announcement extraction and fetching (`AnnouncementExtractor`, `NoticeBoard`)
//! - Webhook delivery (`WebhookNotifier`)

mod announcements;
mod notifier;

pub use announcements::{AnnouncementExtractor, AnnouncementSource, NoticeBoard};
pub use notifier::{
    COLOR_ANNOUNCEMENT, COLOR_STARTED, COLOR_STOPPED, Embed, EmbedField, EmbedFooter, Notifier,
    WebhookNotifier, WebhookPayload,
};
