// src/models/selectors.rs

//! CSS selectors for scraping the notice listing.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping the notice listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeSelectors {
    /// Selector for each notice row
    #[serde(default = "defaults::row_selector")]
    pub row_selector: String,

    /// Selector for the article link within a row
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// Selector for the date cell within a row
    #[serde(default = "defaults::date_selector")]
    pub date_selector: String,

    /// HTML attribute holding the link target (usually "href")
    #[serde(default = "defaults::attr_name")]
    pub attr_name: String,

    /// Query parameter of the article URL carrying the numeric id
    #[serde(default = "defaults::id_param")]
    pub id_param: String,
}

mod defaults {
    pub fn row_selector() -> String {
        "tr.notice".to_string()
    }
    pub fn link_selector() -> String {
        r#"a[href*="/News/Notice/Article"]"#.to_string()
    }
    pub fn date_selector() -> String {
        "td.date".to_string()
    }
    pub fn attr_name() -> String {
        "href".to_string()
    }
    pub fn id_param() -> String {
        "Oid".to_string()
    }
}

impl Default for NoticeSelectors {
    fn default() -> Self {
        Self {
            row_selector: defaults::row_selector(),
            link_selector: defaults::link_selector(),
            date_selector: defaults::date_selector(),
            attr_name: defaults::attr_name(),
            id_param: defaults::id_param(),
        }
    }
}
