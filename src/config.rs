//! Adapter configuration
//!
//! Settings come from an optional TOML file and are overridden by CLI flags.
//! Once handed to an adapter the configuration is never modified.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Tag used when no tag is configured
pub const DEFAULT_TAG: &str = "latest";

/// Default number of repositories requested per catalog page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default number of manifests fetched at once
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Default timeout for registry requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Registry vendor an adapter talks to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// Generic Docker Registry v2 (distribution) registry
    #[default]
    V2,
    /// Amazon Elastic Container Registry
    Ecr,
}

impl RegistryKind {
    /// Returns the adapter name for this registry kind
    pub fn name(&self) -> &'static str {
        match self {
            RegistryKind::V2 => "v2",
            RegistryKind::Ecr => "ecr",
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Settings for one registry adapter
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Which registry vendor to talk to
    pub registry: RegistryKind,
    /// Registry base URL (required for v2 registries)
    pub url: Option<String>,
    /// Organization/namespace filter; empty keeps every repository
    pub org: String,
    /// Image tag to read manifests from; empty means "latest"
    pub tag: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// AWS region for ECR; falls back to the ambient AWS configuration
    pub region: Option<String>,
    pub page_size: usize,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            registry: RegistryKind::default(),
            url: None,
            org: String::new(),
            tag: String::new(),
            username: None,
            password: None,
            region: None,
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("registry", &self.registry)
            .field("url", &self.url)
            .field("org", &self.org)
            .field("tag", &self.tag)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("page_size", &self.page_size)
            .field("concurrency", &self.concurrency)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AdapterConfig {
    /// Create a v2 registry configuration for the given URL
    pub fn v2(url: impl Into<String>) -> Self {
        Self {
            registry: RegistryKind::V2,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Parse configuration from TOML content
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Tag to fetch manifests for, substituting "latest" for an empty tag
    pub fn effective_tag(&self) -> &str {
        if self.tag.is_empty() {
            DEFAULT_TAG
        } else {
            &self.tag
        }
    }

    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether a repository name falls inside the configured organization
    pub fn in_org(&self, repository: &str) -> bool {
        let org = self.org.trim_matches('/');
        if org.is_empty() {
            return true;
        }
        repository == org
            || repository
                .strip_prefix(org)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Check that the configuration is usable for its registry kind
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::invalid_value("page_size", "must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::invalid_value(
                "concurrency",
                "must be at least 1",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "timeout_secs",
                "must be at least 1",
            ));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigError::invalid_value(
                "password",
                "a password needs a username",
            ));
        }

        match (&self.registry, &self.url) {
            (RegistryKind::V2, None) => Err(ConfigError::MissingUrl {
                registry: self.registry.to_string(),
            }),
            (_, Some(url)) => parse_registry_url(url).map(|_| ()),
            (RegistryKind::Ecr, None) => Ok(()),
        }
    }
}

/// Parse a registry base URL, requiring an http(s) scheme and a host
pub fn parse_registry_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        value: value.to_string(),
        message: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            value: value.to_string(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            value: value.to_string(),
            message: "missing host".to_string(),
        });
    }

    Ok(url)
}
