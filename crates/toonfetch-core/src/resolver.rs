//! Video source resolution
//!
//! Turns an open episode page into the playable URL its player computed.
//! Two strategies share the same [`Poller`]:
//!
//! - `FramePolling`: check the page, then every frame, at a fixed interval
//!   for a fixed number of attempts.
//! - `PlayAndWatch`: wait for the video element, start playback, then check
//!   the page at a short interval until a time cap.

use std::time::Duration;

use tracing::{debug, info};

use crate::browser::BrowserDriver;
use crate::config::{ResolveStrategy, ResolverConfig};
use crate::poll::Poller;
use crate::types::VideoSource;

/// Resolves the media source of an episode page
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.config.strategy
    }

    /// Resolve the page's video source with the configured strategy.
    ///
    /// Returns `None` once the poll budget is exhausted; query errors during
    /// polling count as "not yet".
    pub async fn resolve<D: BrowserDriver>(&self, driver: &D, page: &D::Page) -> Option<VideoSource> {
        let source = match self.config.strategy {
            ResolveStrategy::FramePolling => self.resolve_frame_polling(driver, page).await,
            ResolveStrategy::PlayAndWatch => self.resolve_play_and_watch(driver, page).await,
        };

        match &source {
            Some(source) => info!(url = %source.url, "video source resolved"),
            None => debug!(
                selector = %self.config.video_selector,
                "video source not found"
            ),
        }
        source
    }

    async fn resolve_frame_polling<D: BrowserDriver>(
        &self,
        driver: &D,
        page: &D::Page,
    ) -> Option<VideoSource> {
        let poller = Poller::attempts(
            self.config.frame_poll_attempts,
            Duration::from_millis(self.config.frame_poll_interval_ms),
        );
        let selector = self.config.video_selector.as_str();

        poller
            .poll(|| async move { self.check_source(driver, page, selector, true).await })
            .await
    }

    async fn resolve_play_and_watch<D: BrowserDriver>(
        &self,
        driver: &D,
        page: &D::Page,
    ) -> Option<VideoSource> {
        let selector = self.config.video_selector.as_str();

        let appeared = Poller::deadline(
            Duration::from_millis(self.config.selector_timeout_ms),
            Duration::from_millis(self.config.watch_interval_ms),
        )
        .poll(|| async move {
            match driver.element_exists(page, selector).await {
                Ok(true) => Some(()),
                Ok(false) => None,
                Err(e) => {
                    debug!("element check failed: {}", e);
                    None
                }
            }
        })
        .await;

        if appeared.is_none() {
            debug!(selector, "video element never appeared");
            return None;
        }

        if let Err(e) = driver.play_media(page, selector).await {
            debug!("play request failed: {}", e);
        }

        Poller::deadline(
            Duration::from_millis(self.config.watch_timeout_ms),
            Duration::from_millis(self.config.watch_interval_ms),
        )
        .poll(|| async move { self.check_source(driver, page, selector, false).await })
        .await
    }

    async fn check_source<D: BrowserDriver>(
        &self,
        driver: &D,
        page: &D::Page,
        selector: &str,
        include_frames: bool,
    ) -> Option<VideoSource> {
        match driver.query_media_source(page, selector, include_frames).await {
            Ok(Some(src)) => {
                let source = VideoSource::from_resolved(&src);
                if source.is_none() {
                    debug!(src, "ignoring non-downloadable source");
                }
                source
            }
            Ok(None) => None,
            Err(e) => {
                debug!("source query failed: {}", e);
                None
            }
        }
    }
}
