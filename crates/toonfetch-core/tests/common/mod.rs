//! In-memory browser used by the integration tests.
//!
//! Pages are scripted per URL: their HTML, where navigation lands, and when
//! (if ever) the player exposes a source.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use toonfetch_core::{BrowserDriver, FetchError, Result};

#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub html: String,
    /// URL reported after the first navigation (simulates an ad redirect)
    pub first_landing: Option<String>,
    /// Source exposed by the top-level document
    pub source: Option<String>,
    /// Number of source queries that return nothing before `source` shows up
    pub ready_after: usize,
    /// Source only visible inside a frame
    pub frame_source: Option<String>,
    /// Whether the video element exists
    pub has_element: bool,
    /// Source only appears after `play_media`
    pub needs_play: bool,
    pub fail_navigation: bool,
}

pub struct ScriptedHandle {
    pub url: String,
    navigations: AtomicUsize,
    queries: AtomicUsize,
    played: AtomicBool,
}

#[derive(Default)]
pub struct ScriptedDriver {
    pages: HashMap<String, ScriptedPage>,
    events: Mutex<Vec<String>>,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn page(&self, url: &str) -> ScriptedPage {
        self.pages.get(url).cloned().unwrap_or_default()
    }
}

/// Buffer that collects formatted log lines at WARN and above.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's events into the buffer until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn warnings(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(" WARN "))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// HTML listing page with one `.entry-title a` per href.
pub fn listing_html(hrefs: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for href in hrefs {
        html.push_str(&format!(
            r#"<article><h2 class="entry-title"><a href="{}">Episode</a></h2></article>"#,
            href
        ));
    }
    html.push_str("</body></html>");
    html
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    type Page = ScriptedHandle;

    async fn navigate(&self, url: &str) -> Result<ScriptedHandle> {
        self.record(format!("navigate:{}", url));
        if self.page(url).fail_navigation {
            return Err(FetchError::Browser(format!("Failed to navigate to {}", url)));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedHandle {
            url: url.to_string(),
            navigations: AtomicUsize::new(1),
            queries: AtomicUsize::new(0),
            played: AtomicBool::new(false),
        })
    }

    async fn renavigate(&self, page: &ScriptedHandle, url: &str) -> Result<()> {
        self.record(format!("renavigate:{}", url));
        page.navigations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn current_url(&self, page: &ScriptedHandle) -> Result<Option<String>> {
        let scripted = self.page(&page.url);
        if page.navigations.load(Ordering::SeqCst) == 1 {
            if let Some(landing) = scripted.first_landing {
                return Ok(Some(landing));
            }
        }
        Ok(Some(page.url.clone()))
    }

    async fn content(&self, page: &ScriptedHandle) -> Result<String> {
        Ok(self.page(&page.url).html)
    }

    async fn query_media_source(
        &self,
        page: &ScriptedHandle,
        _selector: &str,
        include_frames: bool,
    ) -> Result<Option<String>> {
        self.record(format!("query:{}", page.url));
        let scripted = self.page(&page.url);
        let seen = page.queries.fetch_add(1, Ordering::SeqCst);

        let playing = !scripted.needs_play || page.played.load(Ordering::SeqCst);
        if playing && seen >= scripted.ready_after {
            if let Some(src) = scripted.source {
                return Ok(Some(src));
            }
        }
        if include_frames {
            return Ok(scripted.frame_source);
        }
        Ok(None)
    }

    async fn element_exists(&self, page: &ScriptedHandle, _selector: &str) -> Result<bool> {
        Ok(self.page(&page.url).has_element)
    }

    async fn play_media(&self, page: &ScriptedHandle, _selector: &str) -> Result<()> {
        self.record(format!("play:{}", page.url));
        page.played.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self, page: ScriptedHandle) -> Result<()> {
        self.record(format!("close:{}", page.url));
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
