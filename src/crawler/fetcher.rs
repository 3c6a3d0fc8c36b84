//! HTTP fetcher implementation
//!
//! The engine never talks to `reqwest` directly; it is handed something that
//! implements [`Fetcher`]. This module provides:
//! - The `Fetcher` seam and its response/error types
//! - `HttpFetcher`, the `reqwest`-backed implementation
//! - Status classification for the crawl loop

use crate::config::HttpConfig;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The HTTP status code
    pub status: StatusCode,
    /// Raw response body
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The request never produced a usable response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Something that can GET a URL
///
/// Implementations must eventually return: either a response with any status,
/// or an error when no response could be obtained.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}

/// How the crawl loop treats a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// HTTP 200: extract and store
    Ok,
    /// HTTP 404: abandon the item
    NotFound,
    /// HTTP 429: leave the item pending and back off
    RateLimited,
    /// Anything else
    Other(StatusCode),
}

/// Classifies a response status
///
/// # Classification
///
/// | Status | Class |
/// |--------|-------|
/// | 200 | Ok |
/// | 404 | NotFound |
/// | 429 | RateLimited |
/// | anything else, including other 2xx | Other |
pub fn classify_status(status: StatusCode) -> ResponseClass {
    match status {
        StatusCode::OK => ResponseClass::Ok,
        StatusCode::NOT_FOUND => ResponseClass::NotFound,
        StatusCode::TOO_MANY_REQUESTS => ResponseClass::RateLimited,
        other => ResponseClass::Other(other),
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects follow reqwest's default policy.
///
/// # Arguments
///
/// * `config` - The HTTP transport configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Fetcher` backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::from_client(build_http_client(config)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;

        Ok(FetchResponse::new(status, body.to_vec()))
    }
}
