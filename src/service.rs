use log::{debug, info};

use crate::cache::CacheStore;
use crate::config::ServiceConfig;
use crate::data::{BatchMode, BatchReport, CacheEntry, ImageStats};
use crate::helpers::http_client::HttpClient;
use crate::helpers::imagestore::ImageStore;
use crate::helpers::singleflight::Deduplicator;
use crate::pipeline::ResolutionPipeline;

/// Placeholder artist name used by library scanners when no artist tag is
/// present; never resolved, always an immediate negative result
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Artist image resolution service
///
/// Constructed once per process with injected transport and persistent
/// store; owns the cache, the single-flight registry and the resolution
/// pipeline. Artist names are exact-match identities: no normalization of
/// case, punctuation or whitespace is performed, so two spellings of the
/// same real-world artist are distinct cache keys.
pub struct ArtistImageService {
    cache: CacheStore,
    flights: Deduplicator,
    pipeline: ResolutionPipeline,
}

impl ArtistImageService {
    pub fn new(
        http: Box<dyn HttpClient>,
        store: Box<dyn ImageStore>,
        config: &ServiceConfig,
    ) -> Self {
        ArtistImageService {
            cache: CacheStore::new(store),
            flights: Deduplicator::new(),
            pipeline: ResolutionPipeline::new(http, config),
        }
    }

    /// Check whether a name is excluded from resolution
    fn is_sentinel(artist: &str) -> bool {
        artist.is_empty() || artist == UNKNOWN_ARTIST
    }

    /// Resolve an artist's representative image
    ///
    /// Cache hits (positive or negative) return synchronously with zero
    /// network calls. On a miss, concurrent callers for the same name share
    /// a single resolution; the settled outcome is cached, persisted and
    /// returned. A `None` means "definitively not found", not an error.
    pub fn resolve(&self, artist: &str) -> Option<String> {
        if Self::is_sentinel(artist) {
            debug!("Skipping image resolution for placeholder artist name");
            return None;
        }

        match self.cache.lookup(artist) {
            CacheEntry::Resolved(payload) => return Some(payload),
            CacheEntry::Negative => return None,
            CacheEntry::Unknown => {}
        }

        self.flights.get_or_start(artist, || {
            // The cache may have settled between the lookup above and this
            // flight's registration; never re-run a terminal entry
            match self.cache.lookup(artist) {
                CacheEntry::Resolved(payload) => return Some(payload),
                CacheEntry::Negative => return None,
                CacheEntry::Unknown => {}
            }

            let outcome = self.pipeline.resolve(artist);
            self.cache.commit(artist, outcome.payload.as_deref());
            outcome.payload
        })
    }

    /// Discard a terminal cache entry for an artist and resolve it afresh
    pub fn force_retry(&self, artist: &str) -> Option<String> {
        if Self::is_sentinel(artist) {
            return None;
        }

        self.cache.force_forget(artist);
        self.resolve(artist)
    }

    /// Whether the artist has a terminal cache entry (resolved or negative)
    pub fn has_attempted(&self, artist: &str) -> bool {
        self.cache.lookup(artist) != CacheEntry::Unknown
    }

    /// Snapshot of cache contents plus live in-flight count
    pub fn stats(&self) -> ImageStats {
        let (resolved, negative) = self.cache.counts();
        ImageStats {
            total_attempted: resolved + negative,
            resolved,
            negative,
            pending: self.flights.pending_count(),
        }
    }

    /// Resolve a collection of artists sequentially
    ///
    /// One resolution fully settles before the next starts, which keeps
    /// batch runs predictable and lets the rate limiter pace the external
    /// calls without further coordination. A failure on one artist does not
    /// stop the batch.
    pub fn run_batch(&self, mode: BatchMode, artists: &[String]) -> BatchReport {
        let total = artists.len();
        info!("Starting {:?} batch run over {} artist(s)", mode, total);

        let mut report = BatchReport::default();
        for (index, artist) in artists.iter().enumerate() {
            if Self::is_sentinel(artist) {
                debug!("Skipping placeholder artist in batch run");
                continue;
            }

            let outcome = match mode {
                BatchMode::NewOnly => {
                    if self.has_attempted(artist) {
                        debug!("Skipping already attempted artist '{}'", artist);
                        continue;
                    }
                    self.resolve(artist)
                }
                BatchMode::All => self.resolve(artist),
                BatchMode::RetryFailed => {
                    if self.cache.lookup(artist) != CacheEntry::Negative {
                        debug!("Skipping non-failed artist '{}'", artist);
                        continue;
                    }
                    self.force_retry(artist)
                }
            };

            match outcome {
                Some(_) => report.success_count += 1,
                None => report.fail_count += 1,
            }

            let count = index + 1;
            if count % 10 == 0 || count == total {
                info!("Processed {}/{} artists in batch run", count, total);
            }
        }

        info!(
            "Batch run complete: {} resolved, {} without image",
            report.success_count, report.fail_count
        );
        report
    }
}
