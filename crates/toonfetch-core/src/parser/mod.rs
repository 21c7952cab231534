//! Parsers for listing pages and media URLs
//!
//! This module contains the pure extraction logic used by the pipeline:
//! - `listing`: Parse episode links from a rendered listing page
//! - `media`: Derive file names and classify media URLs

pub mod listing;
pub mod media;

// Re-export main parsing functions
pub use listing::parse_episode_links;
pub use media::{file_extension, file_name_from_url, is_video_content_type};
