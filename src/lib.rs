/// Data types for cache entries, outcomes and batch runs
pub mod data;

/// Configuration utilities with backward compatibility support
pub mod config;

/// Helper utilities: rate limiting, HTTP, external service lookups
pub mod helpers;

/// In-memory cache mirroring the persistent artist image store
pub mod cache;

/// Multi-stage fallback resolution pipeline
pub mod pipeline;

/// Service facade exposed to UI consumers
pub mod service;

/// Logging configuration and utilities
pub mod logging;

pub use crate::config::ServiceConfig;
pub use crate::data::{BatchMode, BatchReport, CacheEntry, ImageStats};
pub use crate::service::{ArtistImageService, UNKNOWN_ARTIST};
