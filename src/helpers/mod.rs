/// Rate limiting for calls to the external metadata services
pub mod ratelimit;

/// HTTP client abstraction and ureq implementation
pub mod http_client;

/// String helpers for safe logging of external data
pub mod sanitize;

/// MusicBrainz API lookups (artist search, URL relations, release groups)
pub mod musicbrainz;

/// Wikimedia Commons file page resolution
pub mod commons;

/// Cover Art Archive lookups
pub mod coverartarchive;

/// Image download and data URI encoding
pub mod imagefetcher;

/// Persistent artist image store (SQLite and in-memory implementations)
pub mod imagestore;

/// Single-flight deduplication of concurrent resolutions
pub mod singleflight;
