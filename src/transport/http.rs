//! reqwest-backed transport.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Method;
use tracing::debug;

use super::{HttpRequest, HttpResponse, Transport};
use crate::error::{CacheError, Result};

const USER_AGENT_VALUE: &str = concat!("fetch_cache/", env!("CARGO_PKG_VERSION"));

/// Transport over a shared `reqwest::Client`.
///
/// Relative paths are joined onto the optional base URL.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl ReqwestTransport {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| CacheError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    /// Resolves `url` against the base URL unless it is already absolute.
    pub fn resolve_url(&self, url: &str) -> Result<String> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(url.to_string());
        }
        match &self.base_url {
            Some(base) => Ok(format!("{}/{}", base, url.trim_start_matches('/'))),
            None => Err(CacheError::Network(format!(
                "relative URL '{}' requires a base URL",
                url
            ))),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = self.resolve_url(&request.url)?;
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| CacheError::Network(format!("invalid method {}: {}", request.method, e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| CacheError::Network(format!("invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| CacheError::Network(format!("invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let mut builder = self.client.request(method, &url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %url, "sending request");
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let transport =
            ReqwestTransport::new(Some("http://api.local/".to_string()), Duration::from_secs(5))
                .unwrap();

        assert_eq!(transport.resolve_url("/users/1").unwrap(), "http://api.local/users/1");
        assert_eq!(transport.resolve_url("users").unwrap(), "http://api.local/users");
        assert_eq!(
            transport.resolve_url("https://other.local/x").unwrap(),
            "https://other.local/x"
        );
    }

    #[test]
    fn test_relative_url_without_base_fails() {
        let transport = ReqwestTransport::new(None, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            transport.resolve_url("/users"),
            Err(CacheError::Network(_))
        ));
    }
}
