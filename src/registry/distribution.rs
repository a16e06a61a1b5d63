//! Docker Registry v2 (distribution) control plane
//!
//! Talks to any registry implementing the distribution API.
//! API endpoints:
//! - Version check: {url}/v2/
//! - Catalog: {url}/v2/_catalog?n={page_size}, continued through `Link: <...>; rel="next"`
//!
//! The authorization token is the base64 of `username:password`, or nothing
//! for registries that allow anonymous reads.

use crate::config::{parse_registry_url, AdapterConfig};
use crate::error::{ConfigError, RegistryError};
use crate::registry::client::HttpFailure;
use crate::registry::session::{AuthorizationData, ControlPlane, RepositoryPage, SessionFactory};
use crate::registry::HttpClient;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LINK};
use serde::Deserialize;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Adapter name for generic v2 registries
pub const REGISTRY_NAME: &str = "v2";

/// Matches the `next` target of an RFC 5988 Link header
static LINK_NEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).unwrap());

/// Catalog response body
#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    repositories: Vec<String>,
}

/// Session factory for a v2 registry
#[derive(Clone, Debug)]
pub struct DistributionSession {
    client: HttpClient,
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
    page_size: usize,
}

impl DistributionSession {
    /// Create a session for the registry at `base_url`
    pub fn new(client: HttpClient, base_url: &Url, page_size: usize) -> Self {
        Self {
            client,
            endpoint: base_url.as_str().trim_end_matches('/').to_string(),
            username: None,
            password: None,
            page_size,
        }
    }

    /// Use basic credentials for every request
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: Option<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Build a session from adapter configuration
    pub fn from_config(config: &AdapterConfig, client: HttpClient) -> Result<Self, ConfigError> {
        let url = config.url.as_deref().ok_or_else(|| ConfigError::MissingUrl {
            registry: REGISTRY_NAME.to_string(),
        })?;
        let base_url = parse_registry_url(url)?;

        let session = Self::new(client, &base_url, config.page_size);
        Ok(match &config.username {
            Some(username) => session.with_credentials(username, config.password.clone()),
            None => session,
        })
    }

    /// base64 of `username:password`, if credentials are configured
    fn basic_token(&self) -> Option<String> {
        self.username.as_ref().map(|username| {
            let password = self.password.as_deref().unwrap_or_default();
            STANDARD.encode(format!("{}:{}", username, password))
        })
    }
}

#[async_trait]
impl SessionFactory for DistributionSession {
    type Client = DistributionClient;

    fn registry_name(&self) -> &'static str {
        REGISTRY_NAME
    }

    async fn connect(&self) -> Result<DistributionClient, RegistryError> {
        let token = self.basic_token();
        let url = format!("{}/v2/", self.endpoint);

        self.client
            .get(&url, auth_headers(token.as_deref()))
            .await
            .map_err(|e| match e.status() {
                Some(401) => RegistryError::connection(
                    REGISTRY_NAME,
                    format!("{} rejected the configured credentials (HTTP 401)", url),
                ),
                _ => RegistryError::connection(REGISTRY_NAME, format!("{}: {}", url, e)),
            })?;

        debug!(
            endpoint = %self.endpoint,
            authenticated = token.is_some(),
            "connected to v2 registry"
        );

        Ok(DistributionClient {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            token,
            page_size: self.page_size,
        })
    }
}

/// Connected v2 registry client
#[derive(Clone, Debug)]
pub struct DistributionClient {
    client: HttpClient,
    endpoint: String,
    token: Option<String>,
    page_size: usize,
}

impl DistributionClient {
    /// URL of the first catalog page
    fn catalog_url(&self) -> String {
        format!("{}/v2/_catalog?n={}", self.endpoint, self.page_size)
    }

    /// Resolve the `next` link of a catalog response, if any
    fn next_link(&self, headers: &HeaderMap) -> Result<Option<String>, RegistryError> {
        let Some(link) = headers.get(LINK) else {
            return Ok(None);
        };
        let link = link.to_str().map_err(|e| {
            RegistryError::listing(REGISTRY_NAME, format!("invalid Link header: {}", e))
        })?;

        let Some(target) = LINK_NEXT_RE.captures(link).and_then(|c| c.get(1)) else {
            return Ok(None);
        };

        // registries usually send a path-absolute link
        let base = Url::parse(&self.endpoint)
            .map_err(|e| RegistryError::listing(REGISTRY_NAME, e.to_string()))?;
        let next = base.join(target.as_str()).map_err(|e| {
            RegistryError::listing(
                REGISTRY_NAME,
                format!("invalid next link '{}': {}", target.as_str(), e),
            )
        })?;

        Ok(Some(next.to_string()))
    }
}

#[async_trait]
impl ControlPlane for DistributionClient {
    async fn list_repositories(
        &self,
        cursor: Option<&str>,
    ) -> Result<RepositoryPage, RegistryError> {
        let url = cursor
            .map(str::to_string)
            .unwrap_or_else(|| self.catalog_url());
        debug!(url = %url, "requesting catalog page");

        let response = self
            .client
            .get(&url, auth_headers(self.token.as_deref()))
            .await
            .map_err(|e| listing_failure(&url, e))?;

        let next = self.next_link(response.headers())?;
        let catalog: CatalogResponse = response.json().await.map_err(|e| {
            RegistryError::listing(
                REGISTRY_NAME,
                format!("invalid catalog response from {}: {}", url, e),
            )
        })?;

        Ok(RepositoryPage::new(catalog.repositories, next))
    }

    async fn authorization_token(&self) -> Result<AuthorizationData, RegistryError> {
        Ok(AuthorizationData::new(
            self.token.clone(),
            self.endpoint.clone(),
        ))
    }
}

fn listing_failure(url: &str, failure: HttpFailure) -> RegistryError {
    RegistryError::listing(REGISTRY_NAME, format!("{}: {}", url, failure))
}

/// Headers carrying the basic token, when there is one
fn auth_headers(token: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        if let Ok(value) = HeaderValue::from_str(&format!("Basic {}", token)) {
            headers.insert(AUTHORIZATION, value);
        }
    }
    headers
}
