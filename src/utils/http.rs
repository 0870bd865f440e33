// src/utils/http.rs

//! HTTP client utilities.

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Create a configured asynchronous HTTP client.
///
/// The same client serves page fetches and webhook deliveries, so both share
/// the request timeout.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Fetch a page asynchronously and return its body.
///
/// Non-success status codes are reported as fetch errors.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::fetch(url, format!("unexpected status {status}")));
    }
    Ok(response.text().await?)
}
