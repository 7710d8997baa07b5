//! Transport Module
//!
//! The single external collaborator of the cache: an opaque HTTP capability.

mod http;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CacheError, Result};

pub use http::ReqwestTransport;

// == Request ==
/// A request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    /// JSON body, if any
    pub body: Option<Value>,
}

// == Response ==
/// What the cache consumes from a response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Lower-cased header names
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// A response with a JSON body.
    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// True for any 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    // == JSON Accessors ==
    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| CacheError::Decode(e.to_string()))
    }

    /// Parses the body as JSON, falling back to the raw text as a JSON string.
    ///
    /// Used for responses that are passed through without caching.
    pub fn json_lenient(&self) -> Value {
        self.json()
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }
}

// == Transport Trait ==
/// Sends one HTTP request. Implementations do not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolves with any response the server produced; rejects with
    /// [`CacheError::Network`] when no response was obtained.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}
