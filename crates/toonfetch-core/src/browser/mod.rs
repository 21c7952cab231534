//! Browser automation boundary
//!
//! The pipeline only talks to a browser through [`BrowserDriver`], so the
//! crawling and resolution logic does not depend on the automation engine.
//! [`ChromiumDriver`] is the CDP implementation used by the CLI.

pub mod chromium;
pub mod filter;

use async_trait::async_trait;

use crate::error::Result;

pub use chromium::{ChromiumDriver, ChromiumPage};
pub use filter::RequestFilter;

/// Returns the video element's `currentSrc`, or an empty string.
///
/// `{selector}` is replaced with a JSON-quoted CSS selector.
pub(crate) const CURRENT_SRC_SCRIPT: &str = r#"(() => {
    const v = document.querySelector({selector});
    return v && v.currentSrc ? v.currentSrc : '';
})()"#;

/// Returns whether an element matches.
pub(crate) const ELEMENT_EXISTS_SCRIPT: &str =
    r#"(() => document.querySelector({selector}) !== null)()"#;

/// Mutes and starts the video element; rejection of `play()` is swallowed.
pub(crate) const PLAY_SCRIPT: &str = r#"(() => {
    const v = document.querySelector({selector});
    if (!v) return false;
    v.muted = true;
    const p = v.play();
    if (p && p.catch) p.catch(() => {});
    return true;
})()"#;

/// Neutralises `window.open` so ad scripts cannot spawn popup windows.
pub(crate) const POPUP_GUARD_SCRIPT: &str = "window.open = function () { return null; };";

/// Substitute a CSS selector into one of the scripts above.
pub(crate) fn with_selector(script: &str, selector: &str) -> String {
    let quoted = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    script.replace("{selector}", &quoted)
}

/// Narrow interface over a browser automation engine.
///
/// A page handle is opened by [`navigate`](Self::navigate), used by the
/// query methods and released by [`close`](Self::close). Only one page is
/// open at a time in the pipeline.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Handle to an open page/tab
    type Page: Send + Sync;

    /// Open a new page and load `url`, waiting for DOM readiness.
    async fn navigate(&self, url: &str) -> Result<Self::Page>;

    /// Load `url` again in an already open page.
    async fn renavigate(&self, page: &Self::Page, url: &str) -> Result<()>;

    /// URL the page currently shows, after any redirects.
    async fn current_url(&self, page: &Self::Page) -> Result<Option<String>>;

    /// Rendered HTML of the page.
    async fn content(&self, page: &Self::Page) -> Result<String>;

    /// Resolved `currentSrc` of the first element matching `selector`.
    ///
    /// Looks at the top-level document first; with `include_frames` it then
    /// looks inside each frame. Empty sources are reported as `None`.
    async fn query_media_source(
        &self,
        page: &Self::Page,
        selector: &str,
        include_frames: bool,
    ) -> Result<Option<String>>;

    /// Whether an element matching `selector` exists in the top-level document.
    async fn element_exists(&self, page: &Self::Page, selector: &str) -> Result<bool>;

    /// Ask the matching media element to start (muted) playback.
    async fn play_media(&self, page: &Self::Page, selector: &str) -> Result<()>;

    /// Close the page.
    async fn close(&self, page: Self::Page) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_selector_quotes_selector() {
        let script = with_selector(CURRENT_SRC_SCRIPT, "video.jw-video");
        assert!(script.contains(r#"document.querySelector("video.jw-video")"#));
        assert!(!script.contains("{selector}"));
    }

    #[test]
    fn test_with_selector_escapes_quotes() {
        let script = with_selector(ELEMENT_EXISTS_SCRIPT, r#"video[data-x="a'b"]"#);
        assert!(script.contains(r#"document.querySelector("video[data-x=\"a'b\"]")"#));
    }
}
