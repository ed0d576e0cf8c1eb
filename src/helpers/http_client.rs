use std::io::Read;
use std::time::Duration;

use log::{debug, error};
use serde_json::Value;
use thiserror::Error;

use crate::helpers::sanitize;

/// Error types that can occur when interacting with HTTP clients
#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("HTTP request error: {0}")]
    RequestError(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Empty response from server")]
    EmptyResponse,

    #[error("Response exceeded the {0} byte limit")]
    TooLarge(u64),
}

/// A trait for HTTP client implementations
///
/// This version avoids generic methods to enable dynamic dispatch; the
/// resolution pipeline only ever talks to external services through a
/// `&dyn HttpClient`.
pub trait HttpClient: Send + Sync + std::fmt::Debug {
    /// Send a GET request with headers and return the parsed JSON body
    fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, HttpClientError>;

    /// Send a GET request and return binary data with its content type
    ///
    /// Bodies larger than `max_bytes` are rejected with
    /// `HttpClientError::TooLarge` instead of being buffered.
    fn get_binary(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        max_bytes: u64,
    ) -> Result<(Vec<u8>, String), HttpClientError>;
}

/// An HTTP client implementation using ureq
#[derive(Clone, Debug)]
pub struct UreqHttpClient {
    timeout: Duration,
}

impl Default for UreqHttpClient {
    fn default() -> Self {
        Self::new(10)
    }
}

impl UreqHttpClient {
    /// Create a new HTTP client with the specified timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn send_get(&self, url: &str, headers: &[(&str, &str)]) -> Result<ureq::Response, HttpClientError> {
        let mut request = ureq::get(url).timeout(self.timeout);
        for &(name, value) in headers {
            request = request.set(name, value);
        }

        match request.call() {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(code, response)) => {
                let error_body = response
                    .into_string()
                    .unwrap_or_else(|_| "<failed to read response body>".to_string());
                debug!("HTTP error {} for {}: {}", code, url, sanitize::safe_truncate(&error_body, 200));
                Err(HttpClientError::ServerError(format!("HTTP {} error", code)))
            }
            Err(e) => {
                debug!("GET request failed: {}", e);
                Err(HttpClientError::RequestError(e.to_string()))
            }
        }
    }
}

impl HttpClient for UreqHttpClient {
    fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, HttpClientError> {
        debug!("GET JSON request to {}", url);

        let response = self.send_get(url, headers)?;

        let response_text = match response.into_string() {
            Ok(text) => text,
            Err(e) => {
                debug!("Failed to read response body: {}", e);
                return Err(HttpClientError::ParseError(format!(
                    "Failed to read response body: {}",
                    e
                )));
            }
        };

        if response_text.is_empty() {
            return Err(HttpClientError::EmptyResponse);
        }

        match serde_json::from_str::<Value>(&response_text) {
            Ok(json_value) => Ok(json_value),
            Err(e) => {
                error!("Failed to parse JSON response: {}", e);
                error!("Response text: {}", sanitize::safe_truncate(&response_text, 500));
                Err(HttpClientError::ParseError(e.to_string()))
            }
        }
    }

    fn get_binary(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        max_bytes: u64,
    ) -> Result<(Vec<u8>, String), HttpClientError> {
        debug!("GET binary request to {}", url);

        let response = self.send_get(url, headers)?;

        // Get the content-type header or default to "application/octet-stream"
        let content_type = response
            .header("content-type")
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut bytes: Vec<u8> = Vec::new();
        // Read one byte past the limit so an oversized body is detectable
        match response
            .into_reader()
            .take(max_bytes + 1)
            .read_to_end(&mut bytes)
        {
            Ok(_) => {
                if bytes.len() as u64 > max_bytes {
                    debug!("Binary response from {} exceeded {} bytes", url, max_bytes);
                    return Err(HttpClientError::TooLarge(max_bytes));
                }
                Ok((bytes, content_type))
            }
            Err(e) => {
                debug!("Failed to read binary response: {}", e);
                Err(HttpClientError::ParseError(format!(
                    "Failed to read binary response: {}",
                    e
                )))
            }
        }
    }
}

// Shared clients can be handed out while a caller retains a handle
impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<Value, HttpClientError> {
        (**self).get_json(url, headers)
    }

    fn get_binary(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        max_bytes: u64,
    ) -> Result<(Vec<u8>, String), HttpClientError> {
        (**self).get_binary(url, headers, max_bytes)
    }
}

/// Create a new HTTP client using the default implementation
pub fn new_http_client(timeout_secs: u64) -> Box<dyn HttpClient> {
    Box::new(UreqHttpClient::new(timeout_secs))
}
