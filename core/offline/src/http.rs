//! Minimal request/response model for the offline worker.

use bytes::Bytes;
use url::Url;

use nightops_common::{Error, Result};

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Other(String),
}

impl Method {
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            other => Method::Other(other.to_string()),
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
}

impl Request {
    /// Build a GET request.
    ///
    /// # Errors
    /// - `InvalidInput` if `url` does not parse
    pub fn get(url: &str) -> Result<Self> {
        Self::new(Method::Get, url)
    }

    /// Build a request with an explicit method.
    ///
    /// # Errors
    /// - `InvalidInput` if `url` does not parse
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::InvalidInput(format!("Invalid URL '{}': {}", url, e)))?;
        Ok(Self { method, url })
    }

    /// Cache key for this request.
    pub fn cache_key(&self) -> &str {
        self.url.as_str()
    }
}

/// Status returned when neither cache nor network can answer.
pub const OFFLINE_STATUS: u16 = 503;

/// A response as stored in a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    pub body: Bytes,
}

impl CachedResponse {
    /// A response with the given status and body.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(200, body)
    }

    /// The synthetic 503 "Offline" response.
    pub fn offline() -> Self {
        Self::new(OFFLINE_STATUS, Bytes::from_static(b"Offline"))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
