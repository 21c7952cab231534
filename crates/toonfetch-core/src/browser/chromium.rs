//! Chromium implementation of [`BrowserDriver`] over the DevTools protocol
//!
//! Every page gets Fetch-domain request interception driven by the
//! configured [`RequestFilter`], plus a script that disables `window.open`.
//! Frames are inspected through their own execution contexts, which also
//! reaches cross-origin player iframes.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    with_selector, BrowserDriver, RequestFilter, CURRENT_SRC_SCRIPT, ELEMENT_EXISTS_SCRIPT,
    PLAY_SCRIPT, POPUP_GUARD_SCRIPT,
};
use crate::config::BrowserSettings;
use crate::error::{FetchError, Result};

fn cdp(e: CdpError) -> FetchError {
    FetchError::Browser(e.to_string())
}

/// Open Chromium tab plus its request interceptor task
pub struct ChromiumPage {
    page: Page,
    interceptor: Option<JoinHandle<()>>,
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        if let Some(task) = self.interceptor.take() {
            task.abort();
        }
    }
}

/// Browser driver backed by a launched Chromium instance
pub struct ChromiumDriver {
    browser: Browser,
    handler: JoinHandle<()>,
    filter: RequestFilter,
}

impl ChromiumDriver {
    /// Launch Chromium with the given settings.
    ///
    /// # Errors
    /// Returns `FetchError::Browser` if the configuration is rejected or the
    /// browser process cannot be started.
    pub async fn launch(settings: &BrowserSettings, filter: RequestFilter) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_size.0, settings.window_size.1);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &settings.executable {
            builder = builder.chrome_executable(executable);
        }
        for arg in &settings.args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(cdp)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler stopped: {}", e);
                    break;
                }
            }
        });

        info!(headless = settings.headless, "browser launched");
        Ok(Self {
            browser,
            handler,
            filter,
        })
    }

    /// Close the browser and wait for the process and handler to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser.close().await.map_err(cdp)?;
        if let Err(e) = self.browser.wait().await {
            warn!("browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        Ok(())
    }

    /// Route the page's requests through the filter.
    async fn install_interceptor(&self, page: &Page) -> Result<Option<JoinHandle<()>>> {
        if self.filter.is_empty() {
            return Ok(None);
        }

        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(cdp)?;
        let intercept_page = page.clone();
        let filter = self.filter.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let outcome = if filter.should_block(&event.request.url) {
                    debug!(url = %event.request.url, "blocked request");
                    intercept_page
                        .execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ())
                } else {
                    intercept_page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = outcome {
                    debug!("interception reply failed: {}", e);
                }
            }
        });

        page.execute(FetchEnableParams::default())
            .await
            .map_err(cdp)?;
        Ok(Some(task))
    }

    async fn evaluate_string(page: &Page, script: &str) -> Result<String> {
        page.evaluate(script)
            .await
            .map_err(cdp)?
            .into_value::<String>()
            .map_err(|e| FetchError::Browser(format!("unexpected script result: {}", e)))
    }

    async fn evaluate_bool(page: &Page, script: &str) -> Result<bool> {
        page.evaluate(script)
            .await
            .map_err(cdp)?
            .into_value::<bool>()
            .map_err(|e| FetchError::Browser(format!("unexpected script result: {}", e)))
    }

    /// Evaluate the source query inside every frame's execution context.
    async fn frame_media_source(page: &Page, script: &str) -> Result<Option<String>> {
        let frames = page.frames().await.map_err(cdp)?;

        for frame_id in frames {
            let context = match page.frame_execution_context(frame_id).await {
                Ok(Some(context)) => context,
                Ok(None) => continue,
                Err(e) => {
                    debug!("frame context unavailable: {}", e);
                    continue;
                }
            };

            let params = EvaluateParams::builder()
                .expression(script)
                .context_id(context)
                .return_by_value(true)
                .build()
                .map_err(FetchError::Browser)?;

            // Frames may be detached or still loading; treat failures as "not yet".
            match page.evaluate_expression(params).await {
                Ok(result) => {
                    if let Ok(src) = result.into_value::<String>() {
                        if !src.is_empty() {
                            return Ok(Some(src));
                        }
                    }
                }
                Err(e) => debug!("frame evaluation failed: {}", e),
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    type Page = ChromiumPage;

    async fn navigate(&self, url: &str) -> Result<ChromiumPage> {
        let page = self.browser.new_page("about:blank").await.map_err(cdp)?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(POPUP_GUARD_SCRIPT))
            .await
            .map_err(cdp)?;
        let interceptor = self.install_interceptor(&page).await?;
        let handle = ChromiumPage { page, interceptor };

        debug!(url, "navigating");
        handle
            .page
            .goto(url)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to navigate to {}: {}", url, e)))?;
        Ok(handle)
    }

    async fn renavigate(&self, page: &ChromiumPage, url: &str) -> Result<()> {
        page.page
            .goto(url)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to navigate to {}: {}", url, e)))?;
        Ok(())
    }

    async fn current_url(&self, page: &ChromiumPage) -> Result<Option<String>> {
        page.page.url().await.map_err(cdp)
    }

    async fn content(&self, page: &ChromiumPage) -> Result<String> {
        page.page.content().await.map_err(cdp)
    }

    async fn query_media_source(
        &self,
        page: &ChromiumPage,
        selector: &str,
        include_frames: bool,
    ) -> Result<Option<String>> {
        let script = with_selector(CURRENT_SRC_SCRIPT, selector);

        let src = Self::evaluate_string(&page.page, &script).await?;
        if !src.is_empty() {
            return Ok(Some(src));
        }
        if !include_frames {
            return Ok(None);
        }
        Self::frame_media_source(&page.page, &script).await
    }

    async fn element_exists(&self, page: &ChromiumPage, selector: &str) -> Result<bool> {
        Self::evaluate_bool(&page.page, &with_selector(ELEMENT_EXISTS_SCRIPT, selector)).await
    }

    async fn play_media(&self, page: &ChromiumPage, selector: &str) -> Result<()> {
        let started = Self::evaluate_bool(&page.page, &with_selector(PLAY_SCRIPT, selector)).await?;
        if !started {
            debug!(selector, "no media element to play");
        }
        Ok(())
    }

    async fn close(&self, page: ChromiumPage) -> Result<()> {
        page.page.clone().close().await.map_err(cdp)
    }
}
