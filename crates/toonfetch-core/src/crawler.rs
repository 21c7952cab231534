//! Listing page crawler
//!
//! Loads the listing page in the browser and collects episode links from the
//! rendered DOM.

use tracing::{info, warn};

use crate::browser::BrowserDriver;
use crate::error::Result;
use crate::parser::parse_episode_links;
use crate::types::EpisodeLink;

/// Collects episode links from one listing page
#[derive(Debug, Clone)]
pub struct Crawler {
    listing_url: String,
    selector: String,
}

impl Crawler {
    pub fn new(listing_url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            selector: selector.into(),
        }
    }

    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }

    /// Load the listing page and return its episode links in document order.
    ///
    /// Relative links are resolved against the URL the page ended up on.
    /// The page is closed whether or not parsing succeeds.
    ///
    /// # Errors
    /// Navigation failures, an unreadable DOM and an invalid selector.
    pub async fn collect<D: BrowserDriver>(&self, driver: &D) -> Result<Vec<EpisodeLink>> {
        info!(url = %self.listing_url, "loading listing page");
        let page = driver.navigate(&self.listing_url).await?;

        let links = self.extract(driver, &page).await;
        if let Err(e) = driver.close(page).await {
            warn!("failed to close listing page: {}", e);
        }
        let links = links?;

        if links.is_empty() {
            warn!(selector = %self.selector, "no episode links matched");
        } else {
            info!("Found {} episodes", links.len());
        }
        Ok(links)
    }

    async fn extract<D: BrowserDriver>(&self, driver: &D, page: &D::Page) -> Result<Vec<EpisodeLink>> {
        let html = driver.content(page).await?;
        let base = driver
            .current_url(page)
            .await?
            .filter(|u| u.starts_with("http"))
            .unwrap_or_else(|| self.listing_url.clone());
        parse_episode_links(&html, &self.selector, &base)
    }
}
