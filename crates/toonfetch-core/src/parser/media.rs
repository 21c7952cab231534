//! Media URL helpers
//!
//! File name derivation and the extension / content-type checks applied
//! before anything is written to disk.

/// Extracts the last path segment of a URL for use as a file name.
///
/// Query and fragment are ignored. Returns `None` if the URL cannot be
/// parsed or the last segment is empty, `.` or `..`.
///
/// # Examples
/// ```
/// use toonfetch_core::parser::file_name_from_url;
///
/// assert_eq!(file_name_from_url("https://cdn.example/video/abc.mp4?t=1").as_deref(), Some("abc.mp4"));
/// assert_eq!(file_name_from_url("https://cdn.example/"), None);
/// ```
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." || segment.contains('\\') {
        return None;
    }
    Some(segment.to_string())
}

/// Lower-cased extension of a file name including the leading dot.
///
/// Returns an empty string when there is none, so it never matches a list
/// entry. A leading dot alone (`.hidden`) is not an extension.
pub fn file_extension(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) => file_name[idx..].to_ascii_lowercase(),
    }
}

/// Whether `extension` is listed, ignoring ASCII case.
pub fn extension_listed(extension: &str, list: &[String]) -> bool {
    !extension.is_empty() && list.iter().any(|e| e.eq_ignore_ascii_case(extension))
}

/// Whether a Content-Type header value denotes a video.
pub fn is_video_content_type(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("video/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://cdn.example/video/abc.mp4").as_deref(),
            Some("abc.mp4")
        );
        assert_eq!(
            file_name_from_url("https://cdn.example/video/abc.mp4#t=10").as_deref(),
            Some("abc.mp4")
        );
        assert_eq!(
            file_name_from_url("https://cdn.example/video/dir/").as_deref(),
            Some("dir")
        );
        assert_eq!(file_name_from_url("https://cdn.example"), None);
        assert_eq!(file_name_from_url("not a url"), None);
    }

    #[test]
    fn test_file_name_rejects_dot_segments() {
        assert_eq!(file_name_from_url("https://cdn.example/a/%2e%2e"), None);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("abc.mp4"), ".mp4");
        assert_eq!(file_extension("ABC.MP4"), ".mp4");
        assert_eq!(file_extension("archive.tar.zip"), ".zip");
        assert_eq!(file_extension("noext"), "");
        assert_eq!(file_extension(".hidden"), "");
    }

    #[test]
    fn test_extension_listed() {
        let list = vec![".mp4".to_string(), ".WEBM".to_string()];
        assert!(extension_listed(".mp4", &list));
        assert!(extension_listed(".webm", &list));
        assert!(!extension_listed(".html", &list));
        assert!(!extension_listed("", &list));
    }

    #[test]
    fn test_is_video_content_type() {
        assert!(is_video_content_type("video/mp4"));
        assert!(is_video_content_type("Video/WebM; codecs=vp9"));
        assert!(!is_video_content_type("text/html; charset=utf-8"));
        assert!(!is_video_content_type(""));
        assert!(!is_video_content_type("application/octet-stream"));
    }
}
