//! Data types for toonfetch
//!
//! Every value here lives for a single pipeline iteration at most.
//! All types implement Serialize so a run can be reported as JSON.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Episode page URL discovered on a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeLink {
    /// 1-based position in the listing (document order)
    pub position: usize,
    /// Absolute URL of the episode page
    pub url: String,
}

/// Playable media URL computed by the page's video player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Absolute http(s) URL of the media resource
    pub url: String,
}

impl VideoSource {
    /// Accepts a resolved `currentSrc` value.
    ///
    /// Empty strings and non-http(s) sources (`blob:`, `data:`) are not
    /// downloadable and yield `None`.
    pub fn from_resolved(src: &str) -> Option<Self> {
        let src = src.trim();
        if src.is_empty() {
            return None;
        }
        let parsed = url::Url::parse(src).ok()?;
        match parsed.scheme() {
            "http" | "https" => Some(Self {
                url: parsed.to_string(),
            }),
            _ => None,
        }
    }
}

/// Media file written to the output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedFile {
    /// Name derived from the last path segment of the source URL
    pub file_name: String,
    /// Full path on disk
    pub path: PathBuf,
    /// Number of body bytes written
    pub bytes: u64,
}

/// Why an episode produced no file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The episode page could not be opened
    Navigation(String),
    /// The player never exposed a playable source
    NoVideoSource,
    /// The downloader refused the source (extension, redirect, content type)
    Rejected(String),
    /// The transfer itself failed
    DownloadFailed(String),
}

/// Episode the pipeline gave up on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEpisode {
    pub link: EpisodeLink,
    pub reason: SkipReason,
}

/// Outcome of one run over a listing page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Listing page that was crawled
    pub listing_url: String,
    /// Number of episode links found on the listing
    pub episodes_found: usize,
    /// Files written, in episode order
    pub downloaded: Vec<DownloadedFile>,
    /// Episodes skipped, in episode order
    pub skipped: Vec<SkippedEpisode>,
}

impl RunSummary {
    /// Create an empty summary for a listing
    pub fn new(listing_url: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            ..Self::default()
        }
    }

    /// Total bytes written during the run
    pub fn total_bytes(&self) -> u64 {
        self.downloaded.iter().map(|f| f.bytes).sum()
    }
}
