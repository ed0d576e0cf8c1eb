use base64::{engine::general_purpose::STANDARD, Engine};
use log::debug;

use crate::helpers::http_client::HttpClient;
use crate::helpers::ratelimit::RateLimiter;

/// Default cap on downloaded image size (10 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// File extensions accepted for direct image downloads
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Check whether a URL path ends in a recognized image file extension
pub fn has_image_extension(url: &str) -> bool {
    // Strip query string and fragment before looking at the extension
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url);

    match path.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Download an image and encode it as a self-contained data URI
///
/// Returns `None` on any transport error, non-success status, oversized
/// body, empty body, or non-image content type. These are stage-local
/// failures: the caller moves on to the next candidate.
pub fn fetch_and_encode(
    http: &dyn HttpClient,
    limiter: &RateLimiter,
    user_agent: &str,
    url: &str,
    max_bytes: u64,
) -> Option<String> {
    limiter.await_turn();

    let (bytes, content_type) = match http.get_binary(url, &[("User-Agent", user_agent)], max_bytes) {
        Ok(result) => result,
        Err(e) => {
            debug!("Image download from {} failed: {}", url, e);
            return None;
        }
    };

    if bytes.is_empty() {
        debug!("Image download from {} returned an empty body", url);
        return None;
    }

    // A wiki article or error page served with 200 is not an image
    if !content_type.starts_with("image/") {
        debug!(
            "Download from {} has content type '{}', not an image",
            url, content_type
        );
        return None;
    }

    debug!("Downloaded {} bytes ({}) from {}", bytes.len(), content_type, url);
    Some(format!("data:{};base64,{}", content_type, STANDARD.encode(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::http_client::testing::ScriptedHttpClient;

    fn limiter() -> RateLimiter {
        RateLimiter::new(0)
    }

    #[test]
    fn test_has_image_extension() {
        assert!(has_image_extension("https://example.org/a.jpg"));
        assert!(has_image_extension("https://example.org/a.JPEG"));
        assert!(has_image_extension("https://example.org/a.png?width=500"));
        assert!(has_image_extension("https://example.org/a.webp#frag"));
        assert!(!has_image_extension("https://example.org/a.svg"));
        assert!(!has_image_extension("https://en.wikipedia.org/wiki/Artist"));
        assert!(!has_image_extension("https://example.org/noextension"));
    }

    #[test]
    fn test_fetch_and_encode_builds_data_uri() {
        let http = ScriptedHttpClient::new().binary("photo.png", b"ABC", "image/png");
        let payload = fetch_and_encode(
            &http,
            &limiter(),
            "test-agent",
            "https://example.org/photo.png",
            DEFAULT_MAX_IMAGE_BYTES,
        );
        assert_eq!(payload, Some("data:image/png;base64,QUJD".to_string()));
    }

    #[test]
    fn test_fetch_and_encode_rejects_non_image_content() {
        let http = ScriptedHttpClient::new().binary("page", b"<html></html>", "text/html");
        let payload = fetch_and_encode(
            &http,
            &limiter(),
            "test-agent",
            "https://example.org/page",
            DEFAULT_MAX_IMAGE_BYTES,
        );
        assert_eq!(payload, None);
    }

    #[test]
    fn test_fetch_and_encode_fails_soft_on_transport_error() {
        let http = ScriptedHttpClient::new().error("photo", "connection refused");
        let payload = fetch_and_encode(
            &http,
            &limiter(),
            "test-agent",
            "https://example.org/photo.jpg",
            DEFAULT_MAX_IMAGE_BYTES,
        );
        assert_eq!(payload, None);
    }

    #[test]
    fn test_fetch_and_encode_enforces_size_cap() {
        let http = ScriptedHttpClient::new().binary("big.jpg", &[0u8; 128], "image/jpeg");
        let payload = fetch_and_encode(
            &http,
            &limiter(),
            "test-agent",
            "https://example.org/big.jpg",
            64,
        );
        assert_eq!(payload, None);
    }

    #[test]
    fn test_fetch_and_encode_rejects_empty_body() {
        let http = ScriptedHttpClient::new().binary("empty.png", b"", "image/png");
        let payload = fetch_and_encode(
            &http,
            &limiter(),
            "test-agent",
            "https://example.org/empty.png",
            DEFAULT_MAX_IMAGE_BYTES,
        );
        assert_eq!(payload, None);
    }
}
