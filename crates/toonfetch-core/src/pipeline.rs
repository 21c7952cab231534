//! Main toonfetch API
//!
//! This module ties the crawler, resolver and downloader together into one
//! sequential run over a listing page. Every per-episode failure is logged
//! and the episode skipped; only a failed crawl aborts the run.

use tracing::{debug, info, warn};

use crate::browser::BrowserDriver;
use crate::config::TargetConfig;
use crate::crawler::Crawler;
use crate::downloader::Downloader;
use crate::error::{FetchError, Result};
use crate::resolver::Resolver;
use crate::types::{DownloadedFile, EpisodeLink, RunSummary, SkipReason, SkippedEpisode};

/// Crawl → resolve → download for one target
///
/// # Example
/// ```no_run
/// use toonfetch_core::browser::{ChromiumDriver, RequestFilter};
/// use toonfetch_core::{Harvester, TargetConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = TargetConfig::default();
///     let filter = RequestFilter::new(&config.request_filter);
///     let driver = ChromiumDriver::launch(&config.browser, filter).await?;
///
///     let harvester = Harvester::new(driver, config)?;
///     let summary = harvester.run().await?;
///     println!("{} downloaded, {} skipped", summary.downloaded.len(), summary.skipped.len());
///
///     harvester.into_driver().shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct Harvester<D: BrowserDriver> {
    driver: D,
    crawler: Crawler,
    resolver: Resolver,
    downloader: Downloader,
    expected_host: Option<String>,
}

impl<D: BrowserDriver> Harvester<D> {
    /// Create a harvester from a driver and a validated target config.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or the HTTP client cannot be created.
    pub fn new(driver: D, config: TargetConfig) -> Result<Self> {
        config.validate()?;
        let expected_host = config.effective_expected_host();
        let crawler = Crawler::new(config.listing_url.clone(), config.episode_selector.clone());
        let resolver = Resolver::new(config.resolver.clone());
        let downloader = Downloader::new(config.download.clone(), config.output_dir.clone())?;

        Ok(Self {
            driver,
            crawler,
            resolver,
            downloader,
            expected_host,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Give the driver back, e.g. to shut the browser down
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Process every episode on the listing page, one at a time.
    ///
    /// # Errors
    /// Only a failure to load or parse the listing page is returned; episode
    /// failures end up in `RunSummary::skipped`.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::new(self.crawler.listing_url());
        info!(
            strategy = ?self.resolver.strategy(),
            output_dir = %self.downloader.output_dir().display(),
            "Crawling {}",
            self.crawler.listing_url()
        );

        let links = self.crawler.collect(&self.driver).await?;
        summary.episodes_found = links.len();

        for link in &links {
            info!("[{}/{}] Visiting: {}", link.position, links.len(), link.url);
            match self.process_episode(link).await {
                Ok(file) => summary.downloaded.push(file),
                Err(reason) => {
                    log_skip(link, &reason);
                    summary.skipped.push(SkippedEpisode {
                        link: link.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            downloaded = summary.downloaded.len(),
            skipped = summary.skipped.len(),
            bytes = summary.total_bytes(),
            "run complete"
        );
        Ok(summary)
    }

    /// navigate → guard → resolve → download, always closing the page.
    async fn process_episode(&self, link: &EpisodeLink) -> std::result::Result<DownloadedFile, SkipReason> {
        let page = self
            .driver
            .navigate(&link.url)
            .await
            .map_err(|e| SkipReason::Navigation(e.to_string()))?;

        let outcome = self.resolve_and_download(link, &page).await;

        if let Err(e) = self.driver.close(page).await {
            warn!("failed to close episode page: {}", e);
        }
        outcome
    }

    async fn resolve_and_download(
        &self,
        link: &EpisodeLink,
        page: &D::Page,
    ) -> std::result::Result<DownloadedFile, SkipReason> {
        self.ensure_on_site(link, page).await?;

        let source = self
            .resolver
            .resolve(&self.driver, page)
            .await
            .ok_or(SkipReason::NoVideoSource)?;

        self.downloader.download(&source).await.map_err(skip_reason)
    }

    /// Retry navigation once when the page landed off-site.
    async fn ensure_on_site(&self, link: &EpisodeLink, page: &D::Page) -> std::result::Result<(), SkipReason> {
        let Some(host) = &self.expected_host else {
            return Ok(());
        };

        let current = self.driver.current_url(page).await.ok().flatten();
        let on_site = current.as_deref().is_some_and(|u| u.contains(host.as_str()));
        if on_site {
            return Ok(());
        }

        warn!(
            landed = current.as_deref().unwrap_or("<unknown>"),
            "Redirect detected, retrying"
        );
        self.driver
            .renavigate(page, &link.url)
            .await
            .map_err(|e| SkipReason::Navigation(e.to_string()))
    }
}

/// One warning per skipped episode. Rejections were already reported by the downloader.
fn log_skip(link: &EpisodeLink, reason: &SkipReason) {
    match reason {
        SkipReason::Rejected(_) => debug!(url = %link.url, reason = ?reason, "skipping episode"),
        _ => warn!(url = %link.url, reason = ?reason, "skipping episode"),
    }
}

fn skip_reason(e: FetchError) -> SkipReason {
    if e.is_rejection() {
        SkipReason::Rejected(e.to_string())
    } else {
        SkipReason::DownloadFailed(e.to_string())
    }
}
