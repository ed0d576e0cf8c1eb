use std::path::PathBuf;

use log::debug;
use serde_json::Value;

use crate::helpers::imagefetcher::DEFAULT_MAX_IMAGE_BYTES;
use crate::helpers::ratelimit::DEFAULT_RATE_LIMIT_MS;

/// Default User-Agent sent to the external services (MusicBrainz requires
/// a meaningful one)
pub const DEFAULT_USER_AGENT: &str = "artistimage/0.3";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Runtime settings for the artist image service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Minimum delay between external API calls in milliseconds
    pub rate_limit_ms: u64,
    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,
    /// User-Agent header for all outbound requests
    pub user_agent: String,
    /// Cap on downloaded image size in bytes
    pub max_image_bytes: u64,
    /// Database file for the persistent store; None selects an in-memory
    /// store with no durability
    pub database_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            database_file: None,
        }
    }
}

/// Look up a service's configuration section
///
/// First tries the `services` structure, then falls back to a top-level
/// key with the service name for older config layouts.
pub fn get_service_config<'a>(config: &'a Value, service_name: &str) -> Option<&'a Value> {
    if let Some(services) = config.get("services") {
        if let Some(service_config) = services.get(service_name) {
            debug!("Found {} configuration in services section", service_name);
            return Some(service_config);
        }
    }

    if let Some(service_config) = config.get(service_name) {
        debug!("Found {} configuration at top level (legacy structure)", service_name);
        return Some(service_config);
    }

    debug!("No {} configuration found", service_name);
    None
}

impl ServiceConfig {
    /// Build settings from a JSON configuration document
    ///
    /// Reads the `artistimage` section; missing keys keep their defaults.
    pub fn from_json(config: &Value) -> Self {
        let mut settings = ServiceConfig::default();

        let section = match get_service_config(config, "artistimage") {
            Some(section) => section,
            None => return settings,
        };

        if let Some(rate_limit_ms) = section.get("rate_limit_ms").and_then(|v| v.as_u64()) {
            settings.rate_limit_ms = rate_limit_ms;
        }
        if let Some(timeout) = section.get("timeout_secs").and_then(|v| v.as_u64()) {
            settings.http_timeout_secs = timeout;
        }
        if let Some(user_agent) = section.get("user_agent").and_then(|v| v.as_str()) {
            settings.user_agent = user_agent.to_string();
        }
        if let Some(max_bytes) = section.get("max_image_bytes").and_then(|v| v.as_u64()) {
            settings.max_image_bytes = max_bytes;
        }
        if let Some(db_file) = section.get("database_file").and_then(|v| v.as_str()) {
            settings.database_file = Some(PathBuf::from(db_file));
        }

        settings
    }
}
