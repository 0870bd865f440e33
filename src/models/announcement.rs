//! Announcement data structure.

use serde::{Deserialize, Serialize};

/// An announcement scraped from the notice listing.
///
/// Identity is `id`: two announcements with the same id are the same entry
/// even if the title was edited in between.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    /// Identifier taken from the article URL
    pub id: String,

    /// Link text of the article
    pub title: String,

    /// Absolute URL of the article
    pub url: String,

    /// Publish date as shown on the site
    pub date: String,
}

impl Announcement {
    /// Format the announcement for display using a template.
    ///
    /// Supported placeholders: `{id}`, `{title}`, `{url}`, `{date}`.
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{id}", &self.id)
            .replace("{title}", &self.title)
            .replace("{url}", &self.url)
            .replace("{date}", &self.date)
    }
}
