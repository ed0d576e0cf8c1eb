use log::{debug, info};

use crate::config::ServiceConfig;
use crate::data::{PipelineStage, ResolutionOutcome};
use crate::helpers::commons;
use crate::helpers::coverartarchive;
use crate::helpers::http_client::HttpClient;
use crate::helpers::imagefetcher;
use crate::helpers::musicbrainz::{self, ArtistRelation};
use crate::helpers::ratelimit::RateLimiter;

/// Relation types considered as image sources, in preferred order
const RELATION_PRIORITY: &[&str] = &["image", "picture", "logo"];

type Stage = fn(&ResolutionPipeline, &str, &str) -> Option<String>;

/// Fallback stages tried after the identity lookup, strictly in order
const STAGES: &[(PipelineStage, Stage)] = &[
    (PipelineStage::RelationScan, ResolutionPipeline::scan_relations),
    (PipelineStage::CoverArtFallback, ResolutionPipeline::release_cover_art),
];

/// Multi-stage fallback resolution of an artist name to an image payload
///
/// Stage order: direct artist search, URL relation scan (with Commons file
/// page resolution), release-group cover art. Each external call passes
/// individually through the shared rate limiter. Every failure below the
/// whole-pipeline level is stage-local: the pipeline moves on to the next
/// candidate or stage and only reports negative once everything is
/// exhausted.
pub struct ResolutionPipeline {
    http: Box<dyn HttpClient>,
    limiter: RateLimiter,
    user_agent: String,
    max_image_bytes: u64,
}

impl ResolutionPipeline {
    pub fn new(http: Box<dyn HttpClient>, config: &ServiceConfig) -> Self {
        ResolutionPipeline {
            http,
            limiter: RateLimiter::new(config.rate_limit_ms),
            user_agent: config.user_agent.clone(),
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Run the full stage sequence for one artist
    ///
    /// A failed identity lookup is an immediate negative outcome; the later
    /// stages depend on the matched artist's MBID and cannot run.
    pub fn resolve(&self, artist_name: &str) -> ResolutionOutcome {
        debug!("Resolving image for artist '{}'", artist_name);

        let mbid = match musicbrainz::search_artist(
            self.http.as_ref(),
            &self.limiter,
            &self.user_agent,
            artist_name,
        ) {
            Some(mbid) => mbid,
            None => {
                debug!("No artist match for '{}', resolution is negative", artist_name);
                return ResolutionOutcome::negative();
            }
        };

        for (stage, run) in STAGES {
            if let Some(payload) = run(self, artist_name, &mbid) {
                info!("Resolved image for '{}' via {:?}", artist_name, stage);
                return ResolutionOutcome::found(payload, *stage);
            }
        }

        info!("No image found for artist '{}', all stages exhausted", artist_name);
        ResolutionOutcome::negative()
    }

    /// Order usable relations by the preferred type list, dropping
    /// everything else
    fn ordered_candidates(relations: Vec<ArtistRelation>) -> Vec<ArtistRelation> {
        let mut candidates = Vec::new();
        for wanted in RELATION_PRIORITY {
            candidates.extend(
                relations
                    .iter()
                    .filter(|rel| rel.relation_type == *wanted)
                    .cloned(),
            );
        }
        candidates
    }

    /// Stage 2: scan the artist's URL relations for a downloadable image
    fn scan_relations(&self, artist_name: &str, mbid: &str) -> Option<String> {
        let relations = musicbrainz::artist_relations(
            self.http.as_ref(),
            &self.limiter,
            &self.user_agent,
            mbid,
        );

        for candidate in Self::ordered_candidates(relations) {
            let url = &candidate.url;

            // The URL itself may be a direct image link
            if imagefetcher::has_image_extension(url) {
                if let Some(payload) = self.download(url) {
                    return Some(payload);
                }
            }

            // A Commons file page needs a secondary lookup for the direct URL
            if commons::is_file_page(url) {
                if let Some(direct_url) = commons::resolve_file_page(
                    self.http.as_ref(),
                    &self.limiter,
                    &self.user_agent,
                    url,
                ) {
                    if let Some(payload) = self.download(&direct_url) {
                        return Some(payload);
                    }
                }
                continue;
            }

            if url.contains("/wiki/") {
                debug!(
                    "Skipping wiki article relation for '{}': {} cannot be resolved to an image",
                    artist_name, url
                );
            }
        }

        None
    }

    /// Stage 3: fall back to the most prominent release group's cover art
    fn release_cover_art(&self, artist_name: &str, mbid: &str) -> Option<String> {
        let release_group = musicbrainz::top_release_group(
            self.http.as_ref(),
            &self.limiter,
            &self.user_agent,
            mbid,
        )?;

        let cover_url = coverartarchive::front_cover_url(
            self.http.as_ref(),
            &self.limiter,
            &self.user_agent,
            &release_group,
        )?;

        debug!(
            "Trying release cover art for '{}' from {}",
            artist_name, cover_url
        );
        self.download(&cover_url)
    }

    fn download(&self, url: &str) -> Option<String> {
        imagefetcher::fetch_and_encode(
            self.http.as_ref(),
            &self.limiter,
            &self.user_agent,
            url,
            self.max_image_bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::http_client::testing::ScriptedHttpClient;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::json;
    use std::sync::Arc;

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            rate_limit_ms: 0,
            ..ServiceConfig::default()
        }
    }

    fn search_response() -> serde_json::Value {
        json!({
            "artists": [{"id": "mbid-1", "name": "Nina Simone", "score": 100}]
        })
    }

    fn pipeline(http: &Arc<ScriptedHttpClient>) -> ResolutionPipeline {
        ResolutionPipeline::new(Box::new(Arc::clone(http)), &test_config())
    }

    #[test]
    fn test_direct_image_relation_short_circuits() {
        // A qualifying image relation downloads on the first candidate;
        // the cover art fallback endpoints are never touched
        let http = Arc::new(
            ScriptedHttpClient::new()
                .json("/artist?query", search_response())
                .json(
                    "/artist/mbid-1",
                    json!({
                        "relations": [
                            {"type": "image", "url": {"resource": "https://example.org/nina.jpg"}}
                        ]
                    }),
                )
                .binary("nina.jpg", b"JPEGDATA", "image/jpeg"),
        );

        let outcome = pipeline(&http).resolve("Nina Simone");

        assert_eq!(outcome.stage, Some(PipelineStage::RelationScan));
        assert!(outcome.payload.is_some());
        assert_eq!(http.count("/artist?query"), 1);
        assert_eq!(http.count("/artist/mbid-1"), 1);
        assert_eq!(http.count("nina.jpg"), 1);
        assert_eq!(http.count("release-group"), 0);
        assert_eq!(http.count("coverartarchive"), 0);
    }

    #[test]
    fn test_commons_file_page_resolved_after_direct_attempt_fails() {
        // The only relation is a Commons file page. The direct download of
        // the page URL fails (it serves HTML), the secondary file-page
        // resolution succeeds and its download wins.
        let http = Arc::new(
            ScriptedHttpClient::new()
                .json("/artist?query", search_response())
                .json(
                    "/artist/mbid-1",
                    json!({
                        "relations": [
                            {"type": "image",
                             "url": {"resource": "https://commons.wikimedia.org/wiki/File:Nina.jpg"}}
                        ]
                    }),
                )
                .binary("/wiki/File:Nina.jpg", b"<html>file page</html>", "text/html")
                .json(
                    "titles=File:Nina.jpg",
                    json!({
                        "query": {"pages": {"1": {"imageinfo": [
                            {"url": "https://upload.wikimedia.org/commons/Nina.jpg"}
                        ]}}}
                    }),
                )
                .binary("upload.wikimedia.org/commons/Nina.jpg", b"REALJPEG", "image/jpeg"),
        );

        let outcome = pipeline(&http).resolve("Nina Simone");

        assert_eq!(outcome.stage, Some(PipelineStage::RelationScan));
        let payload = outcome.payload.unwrap();
        assert_eq!(payload, format!("data:image/jpeg;base64,{}", STANDARD.encode(b"REALJPEG")));
        assert_eq!(http.count("titles=File:Nina.jpg"), 1);
    }

    #[test]
    fn test_no_artist_match_is_negative_with_no_further_calls() {
        let http = Arc::new(ScriptedHttpClient::new().json("/artist?query", json!({"artists": []})));

        let outcome = pipeline(&http).resolve("Nobody");

        assert!(outcome.payload.is_none());
        assert!(outcome.stage.is_none());
        // Only the identity lookup went out
        assert_eq!(http.total_requests(), 1);
    }

    #[test]
    fn test_wiki_article_relations_are_skipped() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .json("/artist?query", search_response())
                .json(
                    "/artist/mbid-1",
                    json!({
                        "relations": [
                            {"type": "image",
                             "url": {"resource": "https://en.wikipedia.org/wiki/Nina_Simone"}}
                        ]
                    }),
                )
                .json("/release-group?artist=mbid-1", json!({"release-groups": []})),
        );

        let outcome = pipeline(&http).resolve("Nina Simone");
        assert!(outcome.payload.is_none());
        // The article page itself was never downloaded
        assert_eq!(http.count("en.wikipedia.org"), 0);
    }

    #[test]
    fn test_cover_art_fallback_runs_when_relations_fail() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .json("/artist?query", search_response())
                .json("/artist/mbid-1", json!({"relations": []}))
                .json(
                    "/release-group?artist=mbid-1",
                    json!({"release-groups": [
                        {"id": "rg-1", "title": "Debut", "primary-type": "Album"}
                    ]}),
                )
                .json(
                    "/release-group/rg-1",
                    json!({"images": [
                        {"image": "https://archive.org/front.png", "front": true}
                    ]}),
                )
                .binary("front.png", b"PNGDATA", "image/png"),
        );

        let outcome = pipeline(&http).resolve("Nina Simone");

        assert_eq!(outcome.stage, Some(PipelineStage::CoverArtFallback));
        assert!(outcome.payload.unwrap().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_relation_order_prefers_image_type() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .json("/artist?query", search_response())
                .json(
                    "/artist/mbid-1",
                    json!({
                        "relations": [
                            {"type": "logo", "url": {"resource": "https://example.org/logo.png"}},
                            {"type": "image", "url": {"resource": "https://example.org/portrait.png"}}
                        ]
                    }),
                )
                .binary("portrait.png", b"PORTRAIT", "image/png")
                .binary("logo.png", b"LOGO", "image/png"),
        );

        let outcome = pipeline(&http).resolve("Nina Simone");

        let payload = outcome.payload.unwrap();
        assert_eq!(payload, format!("data:image/png;base64,{}", STANDARD.encode(b"PORTRAIT")));
        assert_eq!(http.count("logo.png"), 0);
    }

    #[test]
    fn test_failed_candidate_falls_through_to_next() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .json("/artist?query", search_response())
                .json(
                    "/artist/mbid-1",
                    json!({
                        "relations": [
                            {"type": "image", "url": {"resource": "https://example.org/broken.jpg"}},
                            {"type": "image", "url": {"resource": "https://example.org/works.jpg"}}
                        ]
                    }),
                )
                .error("broken.jpg", "connection reset")
                .binary("works.jpg", b"WORKS", "image/jpeg"),
        );

        let outcome = pipeline(&http).resolve("Nina Simone");
        assert!(outcome.payload.is_some());
        assert_eq!(http.count("broken.jpg"), 1);
        assert_eq!(http.count("works.jpg"), 1);
    }

    #[test]
    fn test_all_stages_exhausted_is_negative() {
        let http = Arc::new(
            ScriptedHttpClient::new()
                .json("/artist?query", search_response())
                .json("/artist/mbid-1", json!({"relations": []}))
                .json(
                    "/release-group?artist=mbid-1",
                    json!({"release-groups": [{"id": "rg-1", "primary-type": "Album"}]}),
                ),
        );
        // Cover Art Archive has nothing for rg-1 (unmatched route = 404)

        let outcome = pipeline(&http).resolve("Nina Simone");
        assert!(outcome.payload.is_none());
        assert!(outcome.stage.is_none());
    }
}
