//! Target configuration
//!
//! A `TargetConfig` describes one site to crawl and how to treat what it
//! finds. It is passed into every component at construction; nothing in the
//! library reads process-wide state. Configs can be loaded from TOML, either
//! as a single target or as a `[[target]]` array.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::request_interval;
use crate::error::{FetchError, Result};

/// Default listing page
const DEFAULT_LISTING_URL: &str = "https://www.supercartoons.net/serie/popeye-the-sailor/page/1/";

/// Default User-Agent mimicking a modern browser
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How the resolver extracts the player's source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    /// Poll the page, then every frame, for `currentSrc`
    #[default]
    FramePolling,
    /// Wait for the element, start playback, then poll the page
    PlayAndWatch,
}

/// Player source resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// CSS selector of the player's video element
    pub video_selector: String,
    pub strategy: ResolveStrategy,
    /// FramePolling: number of attempts
    pub frame_poll_attempts: u32,
    /// FramePolling: pause between attempts (ms)
    pub frame_poll_interval_ms: u64,
    /// PlayAndWatch: how long to wait for the video element (ms)
    pub selector_timeout_ms: u64,
    /// PlayAndWatch: pause between source checks (ms)
    pub watch_interval_ms: u64,
    /// PlayAndWatch: give up after this long (ms)
    pub watch_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            video_selector: "video.jw-video".to_string(),
            strategy: ResolveStrategy::FramePolling,
            frame_poll_attempts: 15,
            frame_poll_interval_ms: 1000,
            selector_timeout_ms: 15_000,
            watch_interval_ms: 300,
            watch_timeout_ms: 10_000,
        }
    }
}

/// Download guards and HTTP behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Extensions (with leading dot) accepted as video files
    pub allowed_extensions: Vec<String>,
    /// Extensions (with leading dot) never written to disk
    pub blocked_extensions: Vec<String>,
    /// Apply the two extension lists at all
    pub enforce_extensions: bool,
    /// Refuse 3xx responses instead of following them
    pub block_redirects: bool,
    /// Refuse responses whose Content-Type is not `video/*`
    pub require_video_content_type: bool,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries on 429/5xx after the first attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff (ms)
    pub retry_base_delay_ms: u64,
    /// Maximum media requests per second
    pub requests_per_second: f64,
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: [".mp4", ".webm", ".mkv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blocked_extensions: [
                ".apk", ".exe", ".msi", ".zip", ".rar", ".7z", ".html", ".js", ".php", ".bat",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            enforce_extensions: true,
            block_redirects: true,
            require_video_content_type: true,
            timeout_secs: 300,
            max_retries: 2,
            retry_base_delay_ms: 1000,
            requests_per_second: 1.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Requests the browser refuses to load on episode pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestFilterConfig {
    /// Block when the request host contains any of these
    pub blocked_host_fragments: Vec<String>,
    /// Block when the request path ends with any of these
    pub blocked_suffixes: Vec<String>,
}

impl Default for RequestFilterConfig {
    fn default() -> Self {
        Self {
            blocked_host_fragments: ["ads", "doubleclick", "pop"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blocked_suffixes: [".apk", ".exe", ".zip"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub window_size: (u32, u32),
    /// Extra Chromium command-line flags
    pub args: Vec<String>,
    /// Explicit Chromium executable; auto-detected when unset
    pub executable: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: (1280, 800),
            args: vec!["--autoplay-policy=no-user-gesture-required".to_string()],
            executable: None,
        }
    }
}

/// Everything needed to crawl one listing page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub listing_url: String,
    /// CSS selector of episode anchors on the listing page
    pub episode_selector: String,
    /// Host fragment episode pages must stay on; derived from `listing_url` when unset
    pub expected_host: Option<String>,
    pub output_dir: PathBuf,
    pub resolver: ResolverConfig,
    pub download: DownloadConfig,
    pub request_filter: RequestFilterConfig,
    pub browser: BrowserSettings,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            episode_selector: ".entry-title a".to_string(),
            expected_host: None,
            output_dir: PathBuf::from("videos"),
            resolver: ResolverConfig::default(),
            download: DownloadConfig::default(),
            request_filter: RequestFilterConfig::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl TargetConfig {
    /// Create a config for a listing page with every other value defaulted
    pub fn for_listing(listing_url: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            ..Self::default()
        }
    }

    /// Parse a single target from TOML
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Host fragment used by the redirect guard.
    ///
    /// Falls back to the listing URL host without its `www.` prefix.
    pub fn effective_expected_host(&self) -> Option<String> {
        if let Some(host) = &self.expected_host {
            return Some(host.clone());
        }
        let parsed = url::Url::parse(&self.listing_url).ok()?;
        let host = parsed.host_str()?;
        Some(host.trim_start_matches("www.").to_string())
    }

    /// Check the values components rely on
    pub fn validate(&self) -> Result<()> {
        if self.listing_url.trim().is_empty() {
            return Err(FetchError::InvalidConfig(
                "listing_url cannot be empty".to_string(),
            ));
        }
        url::Url::parse(&self.listing_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.listing_url, e)))?;
        if self.episode_selector.trim().is_empty() {
            return Err(FetchError::InvalidConfig(
                "episode_selector cannot be empty".to_string(),
            ));
        }
        if self.resolver.video_selector.trim().is_empty() {
            return Err(FetchError::InvalidConfig(
                "resolver.video_selector cannot be empty".to_string(),
            ));
        }
        if self.resolver.frame_poll_attempts == 0 {
            return Err(FetchError::InvalidConfig(
                "resolver.frame_poll_attempts must be at least 1".to_string(),
            ));
        }
        if self.resolver.watch_interval_ms == 0 || self.resolver.watch_timeout_ms == 0 {
            return Err(FetchError::InvalidConfig(
                "resolver watch interval and timeout must be positive".to_string(),
            ));
        }
        request_interval(self.download.requests_per_second)?;
        Ok(())
    }
}

/// Config file holding one or more targets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub target: Vec<TargetConfig>,
}

impl ConfigFile {
    /// Parse a config file.
    ///
    /// A file without a `[[target]]` array is read as a single target.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(s)?;
        let file = if file.target.is_empty() {
            ConfigFile {
                target: vec![toml::from_str::<TargetConfig>(s)?],
            }
        } else {
            file
        };
        for target in &file.target {
            target.validate()?;
        }
        Ok(file)
    }

    /// Load and validate a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_toml_str(&data)
    }
}
