//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Status and transport failure classification
//!
//! Requests are never retried here; every failure goes back to the caller.

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("specscan/", env!("CARGO_PKG_VERSION"));

/// Why a request did not produce a successful response
#[derive(Error, Debug)]
pub enum HttpFailure {
    /// The HTTP client itself could not be built
    #[error("failed to create HTTP client: {0}")]
    Build(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status
    #[error("HTTP {status}")]
    Status { status: StatusCode, body: String },

    /// Connection, TLS or body transfer failure
    #[error("{0}")]
    Transport(String),
}

impl HttpFailure {
    /// HTTP status code, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpFailure::Status { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            HttpFailure::Timeout
        } else {
            HttpFailure::Transport(e.to_string())
        }
    }
}

/// HTTP client wrapper used for registry calls
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, HttpFailure> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpFailure> {
        Self::with_config(timeout, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, HttpFailure> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| HttpFailure::Build(e.to_string()))?;

        Ok(Self { client })
    }

    /// Perform a GET request, failing on any non-2xx status
    pub async fn get(&self, url: &str, headers: HeaderMap) -> Result<Response, HttpFailure> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(HttpFailure::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpFailure::Status { status, body });
        }

        Ok(response)
    }

    /// Perform a GET request and return the body bytes
    pub async fn get_bytes(&self, url: &str, headers: HeaderMap) -> Result<Vec<u8>, HttpFailure> {
        let response = self.get(url, headers).await?;
        let body = response.bytes().await.map_err(HttpFailure::from_reqwest)?;
        Ok(body.to_vec())
    }
}
