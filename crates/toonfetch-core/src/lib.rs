//! toonfetch Core Library
//!
//! This crate crawls a cartoon-streaming listing page in a real browser,
//! resolves each episode's playable video URL from its embedded player and
//! downloads the media files.
//!
//! # Features
//! - Crawl a listing page for episode links
//! - Resolve late-bound player sources with bounded polling (page and frames)
//! - Guarded, rate-limited streaming downloads (extension, redirect, content type)
//! - Browser engine behind a narrow trait; Chromium (CDP) implementation included

pub mod browser;
pub mod client;
pub mod config;
pub mod crawler;
pub mod downloader;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod poll;
pub mod resolver;
pub mod types;

// Re-export main types for convenience
pub use browser::{BrowserDriver, ChromiumDriver, RequestFilter};
pub use client::{MediaClient, RateLimiter};
pub use config::{ConfigFile, DownloadConfig, ResolveStrategy, ResolverConfig, TargetConfig};
pub use crawler::Crawler;
pub use downloader::Downloader;
pub use error::{FetchError, Result};
pub use pipeline::Harvester;
pub use poll::Poller;
pub use resolver::Resolver;
pub use types::{DownloadedFile, EpisodeLink, RunSummary, SkipReason, SkippedEpisode, VideoSource};
