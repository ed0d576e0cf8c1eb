use serde::{Deserialize, Serialize};

/// State of a single artist in the image cache
///
/// Absence from the cache is represented as `Unknown`. `Resolved` and
/// `Negative` are terminal: once written they only change through an
/// explicit force-retry that deletes the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// Never attempted
    Unknown,
    /// Successfully fetched and encoded image payload (a data URI)
    Resolved(String),
    /// Attempted, no usable image found or all attempts failed
    Negative,
}

/// Pipeline stage that produced an image, recorded for diagnostics only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    /// Image came from a URL relation on the matched artist record
    RelationScan,
    /// Image came from the release-group cover art fallback
    CoverArtFallback,
}

/// Result of running the resolution pipeline for one artist
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// Encoded image payload, or None if every stage exhausted
    pub payload: Option<String>,
    /// Which stage produced the payload (None for a negative outcome)
    pub stage: Option<PipelineStage>,
}

impl ResolutionOutcome {
    pub fn found(payload: String, stage: PipelineStage) -> Self {
        ResolutionOutcome {
            payload: Some(payload),
            stage: Some(stage),
        }
    }

    pub fn negative() -> Self {
        ResolutionOutcome {
            payload: None,
            stage: None,
        }
    }
}

/// Selection mode for a batch resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchMode {
    /// Resolve only artists that have never been attempted
    NewOnly,
    /// Resolve every non-sentinel artist (cached entries are served from cache)
    All,
    /// Clear and re-resolve artists currently in negative state
    RetryFailed,
}

impl BatchMode {
    /// Parse a mode name as used on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "new-only" => Some(BatchMode::NewOnly),
            "all" => Some(BatchMode::All),
            "retry-failed" => Some(BatchMode::RetryFailed),
            _ => None,
        }
    }
}

/// Aggregate counts reported by a batch resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub success_count: usize,
    pub fail_count: usize,
}

/// Snapshot of cache and in-flight state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageStats {
    /// Number of artists with a terminal cache entry
    pub total_attempted: usize,
    pub resolved: usize,
    pub negative: usize,
    /// Resolutions currently in flight
    pub pending: usize,
}
