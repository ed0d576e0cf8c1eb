use log::debug;
use serde::Deserialize;

use crate::helpers::http_client::HttpClient;
use crate::helpers::ratelimit::RateLimiter;

const COVERART_API_BASE: &str = "https://coverartarchive.org";

#[derive(Debug, Deserialize)]
struct CoverArtResponse {
    #[serde(default)]
    images: Vec<CoverArtImage>,
}

#[derive(Debug, Deserialize)]
struct CoverArtImage {
    image: Option<String>,
    #[serde(default)]
    front: bool,
}

/// Query the Cover Art Archive for a release group's front cover URL
///
/// Falls back to the first listed image if none is flagged as the front
/// cover. Returns `None` when the release group has no images or the
/// request fails.
pub fn front_cover_url(
    http: &dyn HttpClient,
    limiter: &RateLimiter,
    user_agent: &str,
    release_group_id: &str,
) -> Option<String> {
    let url = format!("{}/release-group/{}", COVERART_API_BASE, release_group_id);

    limiter.await_turn();
    debug!("Querying Cover Art Archive: {}", url);

    let value = match http.get_json(&url, &[("User-Agent", user_agent), ("Accept", "application/json")]) {
        Ok(value) => value,
        Err(e) => {
            debug!("Cover Art Archive request for {} failed: {}", release_group_id, e);
            return None;
        }
    };

    let response: CoverArtResponse = match serde_json::from_value(value) {
        Ok(response) => response,
        Err(e) => {
            debug!("Failed to parse Cover Art Archive response: {}", e);
            return None;
        }
    };

    let front = response.images.iter().find(|image| image.front);
    let chosen = front.or_else(|| response.images.first())?;

    match &chosen.image {
        Some(image_url) => {
            debug!(
                "Cover Art Archive has {} image for release group {}",
                if chosen.front { "a front" } else { "a non-front" },
                release_group_id
            );
            Some(image_url.clone())
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::http_client::testing::ScriptedHttpClient;
    use serde_json::json;

    fn limiter() -> RateLimiter {
        RateLimiter::new(0)
    }

    #[test]
    fn test_front_cover_is_preferred() {
        let http = ScriptedHttpClient::new().json(
            "/release-group/rg-1",
            json!({
                "images": [
                    {"image": "https://archive.org/back.jpg", "front": false},
                    {"image": "https://archive.org/front.jpg", "front": true}
                ]
            }),
        );

        let url = front_cover_url(&http, &limiter(), "test-agent", "rg-1");
        assert_eq!(url, Some("https://archive.org/front.jpg".to_string()));
    }

    #[test]
    fn test_first_image_when_no_front_flagged() {
        let http = ScriptedHttpClient::new().json(
            "/release-group/rg-1",
            json!({
                "images": [
                    {"image": "https://archive.org/one.jpg", "front": false},
                    {"image": "https://archive.org/two.jpg", "front": false}
                ]
            }),
        );

        let url = front_cover_url(&http, &limiter(), "test-agent", "rg-1");
        assert_eq!(url, Some("https://archive.org/one.jpg".to_string()));
    }

    #[test]
    fn test_no_images() {
        let http = ScriptedHttpClient::new().json("/release-group/rg-1", json!({"images": []}));
        assert_eq!(front_cover_url(&http, &limiter(), "test-agent", "rg-1"), None);
    }

    #[test]
    fn test_request_failure() {
        // Cover Art Archive returns 404 for release groups with no artwork
        let http = ScriptedHttpClient::new();
        assert_eq!(front_cover_url(&http, &limiter(), "test-agent", "rg-1"), None);
    }
}
