// src/services/announcements.rs

//! Announcement extraction service.
//!
//! Turns the notice listing markup into [`Announcement`] records using the
//! configured CSS selectors, and fetches that markup over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Announcement, Config, NoticeSelectors};
use crate::utils::http::fetch_text;
use crate::utils::normalize_whitespace;
use crate::utils::url::{extract_query_id, resolve, same_origin};

/// Anything that can produce the current list of announcements.
#[async_trait]
pub trait AnnouncementSource: Send + Sync {
    /// Fetch the listing and return its announcements in page order.
    async fn fetch(&self) -> Result<Vec<Announcement>>;
}

/// Extracts announcements from listing markup.
///
/// Extraction never fails: rows that do not match are skipped, so a markup
/// change on the site degrades to fewer (or zero) records.
#[derive(Debug, Clone)]
pub struct AnnouncementExtractor {
    row_sel: Selector,
    link_sel: Selector,
    date_sel: Selector,
    attr_name: String,
    id_param: String,
    base_url: Url,
}

impl AnnouncementExtractor {
    /// Create an extractor, parsing every selector up front.
    pub fn new(selectors: &NoticeSelectors, base_url: &str) -> Result<Self> {
        Ok(Self {
            row_sel: Self::parse_selector(&selectors.row_selector)?,
            link_sel: Self::parse_selector(&selectors.link_selector)?,
            date_sel: Self::parse_selector(&selectors.date_selector)?,
            attr_name: selectors.attr_name.clone(),
            id_param: selectors.id_param.clone(),
            base_url: Url::parse(base_url)?,
        })
    }

    /// Create an extractor from the application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.selectors, &config.crawler.base_url)
    }

    /// Extract all announcements from a listing document, in row order.
    pub fn extract(&self, markup: &str) -> Vec<Announcement> {
        let document = Html::parse_document(markup);
        document
            .select(&self.row_sel)
            .filter_map(|row| self.parse_row(&row))
            .collect()
    }

    fn parse_row(&self, row: &ElementRef) -> Option<Announcement> {
        let (link_elem, url, id) = row
            .select(&self.link_sel)
            .find_map(|link| self.article_link(link))?;

        let title = normalize_whitespace(&link_elem.text().collect::<String>());
        let date = row
            .select(&self.date_sel)
            .next()
            .map(|cell| normalize_whitespace(&cell.text().collect::<String>()))
            .unwrap_or_default();

        Some(Announcement {
            id,
            title,
            url: url.to_string(),
            date,
        })
    }

    /// Resolve a link element to its absolute URL and id, if it points at an article.
    fn article_link<'a>(&self, link: ElementRef<'a>) -> Option<(ElementRef<'a>, Url, String)> {
        let href = link.value().attr(&self.attr_name)?;
        let url = resolve(&self.base_url, href)?;
        if !same_origin(&url, &self.base_url) {
            log::debug!("Skipping off-site article link: {}", url);
            return None;
        }
        let id = extract_query_id(&url, &self.id_param)?;
        Some((link, url, id))
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// The notice listing page, fetched over HTTP.
pub struct NoticeBoard {
    client: Client,
    list_url: String,
    extractor: AnnouncementExtractor,
}

impl NoticeBoard {
    pub fn new(client: Client, list_url: impl Into<String>, extractor: AnnouncementExtractor) -> Self {
        Self {
            client,
            list_url: list_url.into(),
            extractor,
        }
    }

    /// Build the board from configuration, sharing the given client.
    pub fn from_config(config: &Config, client: Client) -> Result<Self> {
        let extractor = AnnouncementExtractor::from_config(config)?;
        Ok(Self::new(client, config.crawler.list_url.clone(), extractor))
    }
}

#[async_trait]
impl AnnouncementSource for NoticeBoard {
    async fn fetch(&self) -> Result<Vec<Announcement>> {
        let html = fetch_text(&self.client, &self.list_url).await?;
        let announcements = self.extractor.extract(&html);
        log::debug!(
            "Extracted {} announcements from {}",
            announcements.len(),
            self.list_url
        );
        Ok(announcements)
    }
}
