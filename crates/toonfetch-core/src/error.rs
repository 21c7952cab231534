//! Error types for toonfetch
//!
//! This module defines all error types used throughout the library.
//! FetchError implements Serialize so skip reasons can be reported as JSON.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for toonfetch operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Browser automation failed (launch, navigation, evaluation)
    #[error("Browser error: {0}")]
    Browser(String),

    /// CSS selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration value is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// No usable file name could be derived from the media URL
    #[error("Cannot derive a file name from: {0}")]
    InvalidFileName(String),

    /// File extension is on the blocked list
    #[error("Blocked dangerous file: {0}")]
    BlockedExtension(String),

    /// File extension is not on the allowed list
    #[error("Not a video file: {0}")]
    DisallowedExtension(String),

    /// Server answered with a redirect while redirects are blocked
    #[error("Redirect blocked ({status}) for {url}")]
    RedirectBlocked { status: u16, url: String },

    /// Server answered with a non-success status
    #[error("Download failed with HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Rate limited by the server (HTTP 429) after all retries
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Response is not a video
    #[error("Invalid content-type ({content_type}) for {file_name}")]
    InvalidContentType {
        content_type: String,
        file_name: String,
    },
}

impl FetchError {
    /// Whether the error is a policy rejection rather than a transport failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            FetchError::InvalidFileName(_)
                | FetchError::BlockedExtension(_)
                | FetchError::DisallowedExtension(_)
                | FetchError::RedirectBlocked { .. }
                | FetchError::InvalidContentType { .. }
        )
    }
}

/// Serialize FetchError as its display string
impl Serialize for FetchError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for toonfetch operations
pub type Result<T> = std::result::Result<T, FetchError>;
