use log::{debug, error, info};
use serde::Deserialize;
use urlencoding::encode;

use crate::helpers::http_client::HttpClient;
use crate::helpers::ratelimit::RateLimiter;

// MusicBrainz API Constants
const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2";
const MUSICBRAINZ_SEARCH_LIMIT: u32 = 3; // Limit search results to save bandwidth
const RELEASE_GROUP_LIMIT: u32 = 25;

/// Structs for deserializing MusicBrainz API responses
#[derive(Debug, Deserialize)]
struct ArtistSearchResponse {
    #[serde(default)]
    artists: Vec<ArtistSearchMatch>,
}

#[derive(Debug, Deserialize)]
struct ArtistSearchMatch {
    id: String,
    name: String,
    #[allow(dead_code)]
    score: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ArtistDetailResponse {
    #[serde(default)]
    relations: Vec<RawRelation>,
}

#[derive(Debug, Deserialize)]
struct RawRelation {
    #[serde(rename = "type")]
    relation_type: Option<String>,
    url: Option<RelationUrl>,
}

#[derive(Debug, Deserialize)]
struct RelationUrl {
    resource: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseGroupResponse {
    #[serde(rename = "release-groups", default)]
    release_groups: Vec<ReleaseGroup>,
}

#[derive(Debug, Deserialize)]
struct ReleaseGroup {
    id: String,
    title: Option<String>,
    #[serde(rename = "primary-type")]
    primary_type: Option<String>,
}

/// A typed URL relation on an artist record, with missing fields already
/// filtered out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRelation {
    pub relation_type: String,
    pub url: String,
}

/// Rate-limited GET against the MusicBrainz API, parsed into `T`
///
/// Any shape mismatch in the response is reported as a failure here and
/// treated as a stage-local failure by the caller.
fn musicbrainz_api_get<T: serde::de::DeserializeOwned>(
    http: &dyn HttpClient,
    limiter: &RateLimiter,
    user_agent: &str,
    url: &str,
) -> Option<T> {
    limiter.await_turn();
    debug!("Making MusicBrainz API request: {}", url);

    let headers = [("User-Agent", user_agent), ("Accept", "application/json")];
    let value = match http.get_json(url, &headers) {
        Ok(value) => value,
        Err(e) => {
            error!("MusicBrainz API request failed: {}", e);
            return None;
        }
    };

    match serde_json::from_value::<T>(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            error!("Failed to parse MusicBrainz API response: {}", e);
            None
        }
    }
}

/// Search MusicBrainz for an artist by name and return the best match's MBID
///
/// The artist name is used as given; no normalization of spelling variants
/// is performed. Returns `None` on no match or any request/parse failure.
pub fn search_artist(
    http: &dyn HttpClient,
    limiter: &RateLimiter,
    user_agent: &str,
    artist_name: &str,
) -> Option<String> {
    let url = format!(
        "{}/artist?query=artist:{}&fmt=json&limit={}",
        MUSICBRAINZ_API_BASE,
        encode(artist_name),
        MUSICBRAINZ_SEARCH_LIMIT
    );

    let response: ArtistSearchResponse = musicbrainz_api_get(http, limiter, user_agent, &url)?;

    match response.artists.into_iter().next() {
        Some(artist) => {
            debug!(
                "Found matching artist '{}' with MBID {} for '{}'",
                artist.name, artist.id, artist_name
            );
            Some(artist.id)
        }
        None => {
            info!("No MusicBrainz match for artist '{}'", artist_name);
            None
        }
    }
}

/// Fetch the artist's detailed record and return its URL relations
///
/// Relations with a missing type or URL are dropped. Returns an empty list
/// on any failure.
pub fn artist_relations(
    http: &dyn HttpClient,
    limiter: &RateLimiter,
    user_agent: &str,
    mbid: &str,
) -> Vec<ArtistRelation> {
    let url = format!("{}/artist/{}?inc=url-rels&fmt=json", MUSICBRAINZ_API_BASE, mbid);

    let response: Option<ArtistDetailResponse> =
        musicbrainz_api_get(http, limiter, user_agent, &url);

    let relations: Vec<ArtistRelation> = response
        .map(|detail| {
            detail
                .relations
                .into_iter()
                .filter_map(|rel| {
                    let relation_type = rel.relation_type?;
                    let url = rel.url?.resource?;
                    Some(ArtistRelation { relation_type, url })
                })
                .collect()
        })
        .unwrap_or_default();

    debug!("Artist {} has {} usable URL relation(s)", mbid, relations.len());
    relations
}

/// Find the artist's most prominent release group
///
/// Prefers the first release group with primary type "Album", falling back
/// to the first one listed. Returns the release group MBID.
pub fn top_release_group(
    http: &dyn HttpClient,
    limiter: &RateLimiter,
    user_agent: &str,
    mbid: &str,
) -> Option<String> {
    let url = format!(
        "{}/release-group?artist={}&fmt=json&limit={}",
        MUSICBRAINZ_API_BASE, mbid, RELEASE_GROUP_LIMIT
    );

    let response: ReleaseGroupResponse = musicbrainz_api_get(http, limiter, user_agent, &url)?;

    let album = response
        .release_groups
        .iter()
        .find(|group| group.primary_type.as_deref() == Some("Album"));

    let chosen = album.or_else(|| response.release_groups.first())?;
    debug!(
        "Selected release group {} ('{}') for artist {}",
        chosen.id,
        chosen.title.as_deref().unwrap_or("untitled"),
        mbid
    );
    Some(chosen.id.clone())
}
