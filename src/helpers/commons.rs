use log::debug;
use serde_json::Value;

use crate::helpers::http_client::HttpClient;
use crate::helpers::ratelimit::RateLimiter;

const COMMONS_API_BASE: &str = "https://commons.wikimedia.org/w/api.php";

/// Check whether a URL is a file description page on Wikimedia Commons
///
/// Only `File:` pages can be resolved to a direct image URL; generic wiki
/// article pages cannot.
pub fn is_file_page(url: &str) -> bool {
    url.contains("commons.wikimedia.org") && url.contains("/wiki/File:")
}

/// Extract the `File:...` title from a Commons file page URL path
fn file_title(page_url: &str) -> Option<&str> {
    let (_, title) = page_url.split_once("/wiki/")?;
    // Drop query string and fragment; the title itself stays URL-encoded
    let title = title.split(['?', '#']).next().unwrap_or(title);
    if title.starts_with("File:") && title.len() > "File:".len() {
        Some(title)
    } else {
        None
    }
}

/// Resolve a Commons file page URL to the direct image URL via the
/// imageinfo API
///
/// Failure at any point (malformed URL, API error, missing fields) returns
/// `None`; the caller skips this candidate and continues with the next
/// relation.
pub fn resolve_file_page(
    http: &dyn HttpClient,
    limiter: &RateLimiter,
    user_agent: &str,
    page_url: &str,
) -> Option<String> {
    let title = match file_title(page_url) {
        Some(title) => title,
        None => {
            debug!("Not a resolvable Commons file page URL: {}", page_url);
            return None;
        }
    };

    let url = format!(
        "{}?action=query&titles={}&prop=imageinfo&iiprop=url&format=json",
        COMMONS_API_BASE, title
    );

    limiter.await_turn();
    debug!("Resolving Commons file page: {}", url);

    let response = match http.get_json(&url, &[("User-Agent", user_agent)]) {
        Ok(value) => value,
        Err(e) => {
            debug!("Commons API request for '{}' failed: {}", title, e);
            return None;
        }
    };

    // The pages object is keyed by page id, so navigate dynamically
    let pages = response.get("query")?.get("pages")?;
    if let Value::Object(map) = pages {
        for (_, page) in map {
            if let Some(info) = page.get("imageinfo").and_then(|i| i.get(0)) {
                if let Some(direct_url) = info.get("url").and_then(|u| u.as_str()) {
                    debug!("Resolved '{}' to direct image URL {}", title, direct_url);
                    return Some(direct_url.to_string());
                }
            }
        }
    }

    debug!("Commons API response for '{}' contained no image info", title);
    None
}
