//! Listing page parser
//!
//! Extracts episode links from the HTML of a rendered listing page.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::{FetchError, Result};
use crate::types::EpisodeLink;

/// Parse episode links from listing page HTML.
///
/// Every element matching `selector` that carries an `href` contributes one
/// link, in document order. Relative hrefs are resolved against `base_url`
/// the same way a browser resolves `a.href`. Duplicates are kept.
///
/// # Arguments
/// * `html` - Rendered HTML of the listing page
/// * `selector` - CSS selector matching episode anchors
/// * `base_url` - URL the page was loaded from
///
/// # Returns
/// * `Ok(Vec<EpisodeLink>)` (possibly empty)
/// * `Err(FetchError::InvalidSelector)` if the selector cannot be parsed
/// * `Err(FetchError::InvalidUrl)` if `base_url` is not absolute
///
/// # Examples
/// ```
/// use toonfetch_core::parser::parse_episode_links;
///
/// let html = r#"<h2 class="entry-title"><a href="/cartoon/1/">One</a></h2>"#;
/// let links = parse_episode_links(html, ".entry-title a", "https://toons.example/list/").unwrap();
/// assert_eq!(links[0].url, "https://toons.example/cartoon/1/");
/// ```
pub fn parse_episode_links(html: &str, selector: &str, base_url: &str) -> Result<Vec<EpisodeLink>> {
    let selector = Selector::parse(selector)
        .map_err(|e| FetchError::InvalidSelector(format!("{}: {:?}", selector, e)))?;
    let base = Url::parse(base_url)
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base_url, e)))?;

    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            debug!("matched element without href");
            continue;
        };
        match resolve_href(&base, href) {
            Some(url) => links.push(EpisodeLink {
                position: links.len() + 1,
                url,
            }),
            None => debug!(href, "skipping unresolvable href"),
        }
    }

    Ok(links)
}

/// Resolve an href against the page URL, keeping only http(s) targets.
fn resolve_href(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
