//! Request blocking for episode pages
//!
//! Streaming sites load ad networks that open popups or push executables.
//! The browser consults a `RequestFilter` for every request it intercepts.

use url::Url;

use crate::config::RequestFilterConfig;

/// Decides which browser requests are aborted
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    host_fragments: Vec<String>,
    suffixes: Vec<String>,
}

impl RequestFilter {
    pub fn new(config: &RequestFilterConfig) -> Self {
        Self {
            host_fragments: config
                .blocked_host_fragments
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_ascii_lowercase())
                .collect(),
            suffixes: config
                .blocked_suffixes
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.host_fragments.is_empty() && self.suffixes.is_empty()
    }

    /// Whether the request for `url` should be aborted.
    ///
    /// Host fragments are matched against the host only, so a page path
    /// that happens to contain a fragment (`/popeye/`) stays reachable.
    /// Suffixes are matched against the path without query or fragment.
    /// Unparsable URLs are let through.
    pub fn should_block(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if let Some(host) = parsed.host_str() {
            let host = host.to_ascii_lowercase();
            if self.host_fragments.iter().any(|f| host.contains(f.as_str())) {
                return true;
            }
        }

        let path = parsed.path().to_ascii_lowercase();
        self.suffixes.iter().any(|s| path.ends_with(s.as_str()))
    }
}
