//! Media downloader
//!
//! Streams a resolved video source into the output directory. Guards run in
//! a fixed order and no file is created unless all of them pass:
//! file name, blocked extension, allowed extension, HTTP status/redirect,
//! content type. The body is written to `<name>.part` and renamed on success.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::client::MediaClient;
use crate::config::DownloadConfig;
use crate::error::{FetchError, Result};
use crate::parser::media::{extension_listed, file_extension, file_name_from_url, is_video_content_type};
use crate::types::{DownloadedFile, VideoSource};

/// Writes video sources to disk
pub struct Downloader {
    client: MediaClient,
    config: DownloadConfig,
    output_dir: PathBuf,
}

impl Downloader {
    /// Create a downloader writing into `output_dir`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: DownloadConfig, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = MediaClient::with_config(&config)?;
        Ok(Self {
            client,
            config,
            output_dir: output_dir.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Check name and extension without touching the network.
    ///
    /// # Returns
    /// The file name to write on success.
    pub fn check_source(&self, source: &VideoSource) -> Result<String> {
        let file_name = file_name_from_url(&source.url)
            .ok_or_else(|| FetchError::InvalidFileName(source.url.clone()))?;

        if self.config.enforce_extensions {
            let extension = file_extension(&file_name);
            if extension_listed(&extension, &self.config.blocked_extensions) {
                return Err(FetchError::BlockedExtension(file_name));
            }
            if !extension_listed(&extension, &self.config.allowed_extensions) {
                return Err(FetchError::DisallowedExtension(file_name));
            }
        }

        Ok(file_name)
    }

    /// Download a video source.
    ///
    /// # Errors
    /// - `BlockedExtension` / `DisallowedExtension` / `InvalidFileName` before any request
    /// - `RedirectBlocked`, `HttpStatus`, `RateLimited` from the response status
    /// - `InvalidContentType` when the response is not a video
    /// - `Http` / `Io` for transfer and filesystem failures
    pub async fn download(&self, source: &VideoSource) -> Result<DownloadedFile> {
        let result = self.fetch_to_disk(source).await;
        if let Err(e) = &result {
            if e.is_rejection() {
                warn!(url = %source.url, "Rejected: {}", e);
            }
        }
        result
    }

    async fn fetch_to_disk(&self, source: &VideoSource) -> Result<DownloadedFile> {
        let file_name = self.check_source(source)?;

        info!(url = %source.url, "Downloading");
        let mut response = self.client.get(&source.url).await?;

        if self.config.require_video_content_type {
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            if !is_video_content_type(&content_type) {
                return Err(FetchError::InvalidContentType {
                    content_type,
                    file_name,
                });
            }
        }

        fs::create_dir_all(&self.output_dir).await?;
        let final_path = self.output_dir.join(&file_name);
        let part_path = self.output_dir.join(format!("{}.part", file_name));

        let written = match write_body(&mut response, &part_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                discard_part(&part_path).await;
                return Err(e);
            }
        };
        if let Err(e) = fs::rename(&part_path, &final_path).await {
            discard_part(&part_path).await;
            return Err(e.into());
        }

        info!(bytes = written, "Saved {}", final_path.display());
        Ok(DownloadedFile {
            file_name,
            path: final_path,
            bytes: written,
        })
    }
}

/// Remove a partial file left by a failed download.
async fn discard_part(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!("failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Stream the response body chunk by chunk into `path`.
async fn write_body(response: &mut reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = fs::File::create(path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloader() -> Downloader {
        Downloader::new(DownloadConfig::default(), "videos").unwrap()
    }

    fn source(url: &str) -> VideoSource {
        VideoSource {
            url: url.to_string(),
        }
    }

    #[test]
    fn test_check_source_accepts_allowed_video() {
        let name = downloader()
            .check_source(&source("https://cdn.example/video/abc.mp4"))
            .unwrap();
        assert_eq!(name, "abc.mp4");
    }

    #[test]
    fn test_check_source_blocked_extension() {
        let result = downloader().check_source(&source("https://cdn.example/setup.exe"));
        assert!(matches!(result, Err(FetchError::BlockedExtension(name)) if name == "setup.exe"));

        let result = downloader().check_source(&source("https://cdn.example/pack.ZIP"));
        assert!(matches!(result, Err(FetchError::BlockedExtension(_))));
    }

    #[test]
    fn test_check_source_disallowed_extension() {
        let result = downloader().check_source(&source("https://cdn.example/video/clip.avi"));
        assert!(matches!(result, Err(FetchError::DisallowedExtension(_))));

        let result = downloader().check_source(&source("https://cdn.example/video/noext"));
        assert!(matches!(result, Err(FetchError::DisallowedExtension(_))));
    }

    #[test]
    fn test_check_source_html_is_blocked_before_allow_list() {
        let result = downloader().check_source(&source("https://cdn.example/page.html"));
        assert!(matches!(result, Err(FetchError::BlockedExtension(_))));
    }

    #[test]
    fn test_check_source_without_name() {
        let result = downloader().check_source(&source("https://cdn.example/"));
        assert!(matches!(result, Err(FetchError::InvalidFileName(_))));
    }

    #[test]
    fn test_check_source_extension_policy_disabled() {
        let config = DownloadConfig {
            enforce_extensions: false,
            ..DownloadConfig::default()
        };
        let downloader = Downloader::new(config, "videos").unwrap();
        let name = downloader
            .check_source(&source("https://cdn.example/stream/master"))
            .unwrap();
        assert_eq!(name, "master");
    }
}
