//! Registry adapters for listing images and fetching their specs
//!
//! This module provides:
//! - HTTP client shared foundation
//! - The vendor control-plane capability (session, paged listing, token)
//! - Manifest retrieval and spec extraction
//! - A generic adapter over any vendor session
//! - Docker Registry v2 and Amazon ECR vendors

mod adapter;
mod client;
mod distribution;
#[cfg(feature = "ecr")]
mod ecr;
mod manifest;
mod session;

pub use adapter::SpecAdapter;
pub use client::{HttpClient, HttpFailure};
pub use distribution::{DistributionClient, DistributionSession};
#[cfg(feature = "ecr")]
pub use ecr::{EcrClient, EcrSession};
pub use manifest::{
    extract_spec, image_reference, manifest_url, ManifestFetcher, BUNDLE_RUNTIME_LABEL,
    BUNDLE_SPEC_LABEL,
};
pub use session::{
    repository_pages, AuthorizationData, ControlPlane, RepositoryPage, SessionFactory,
};

use crate::config::{AdapterConfig, RegistryKind};
use crate::domain::Spec;
use crate::error::{ConfigError, RegistryError};
use async_trait::async_trait;

/// Trait for registry adapters
///
/// Implementations are interchangeable: a catalog only needs these three
/// operations, whatever the registry vendor.
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// List every image name in the registry
    ///
    /// A listing that fails part way returns the names gathered so far
    /// together with the error.
    async fn get_image_names(&self) -> Partial<String>;

    /// Fetch the spec of each named image, stopping at the first failure
    async fn fetch_specs(&self, names: &[String]) -> Partial<Spec>;
}

/// Results gathered by a registry operation, plus the error that ended it early
#[derive(Debug)]
pub struct Partial<T> {
    /// Items collected before the operation finished or failed
    pub items: Vec<T>,
    /// Error that stopped the operation, if any
    pub error: Option<RegistryError>,
}

impl<T> Partial<T> {
    /// Operation ran to completion
    pub fn complete(items: Vec<T>) -> Self {
        Self { items, error: None }
    }

    /// Operation stopped after collecting some items
    pub fn interrupted(items: Vec<T>, error: RegistryError) -> Self {
        Self {
            items,
            error: Some(error),
        }
    }

    /// Operation failed before collecting anything
    pub fn failed(error: RegistryError) -> Self {
        Self::interrupted(Vec::new(), error)
    }

    /// Returns true if no error occurred
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Split into items and error
    pub fn into_parts(self) -> (Vec<T>, Option<RegistryError>) {
        (self.items, self.error)
    }

    /// Discard partial items if an error occurred
    pub fn into_result(self) -> Result<Vec<T>, RegistryError> {
        match self.error {
            None => Ok(self.items),
            Some(e) => Err(e),
        }
    }
}

/// Create a registry adapter for the configured registry kind
pub fn create_adapter(config: &AdapterConfig) -> Result<Box<dyn RegistryAdapter>, ConfigError> {
    config.validate()?;
    let http = HttpClient::with_timeout(config.timeout())
        .map_err(|e| ConfigError::invalid_value("timeout_secs", e.to_string()))?;

    match config.registry {
        RegistryKind::V2 => {
            let session = DistributionSession::from_config(config, http.clone())?;
            Ok(Box::new(SpecAdapter::new(config.clone(), session, http)))
        }
        #[cfg(feature = "ecr")]
        RegistryKind::Ecr => {
            let session = EcrSession::from_config(config);
            Ok(Box::new(SpecAdapter::new(config.clone(), session, http)))
        }
        #[cfg(not(feature = "ecr"))]
        RegistryKind::Ecr => Err(ConfigError::UnsupportedRegistry {
            registry: RegistryKind::Ecr.to_string(),
            feature: "ecr".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_complete() {
        let partial = Partial::complete(vec![1, 2]);
        assert!(partial.is_complete());
        assert_eq!(partial.into_result().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_partial_interrupted_keeps_items() {
        let partial = Partial::interrupted(vec!["a"], RegistryError::listing("v2", "boom"));
        assert!(!partial.is_complete());
        let (items, error) = partial.into_parts();
        assert_eq!(items, vec!["a"]);
        assert!(error.is_some());
    }

    #[test]
    fn test_partial_failed() {
        let partial: Partial<String> = Partial::failed(RegistryError::auth("v2", "denied"));
        assert!(partial.items.is_empty());
        assert!(partial.into_result().is_err());
    }

    #[test]
    fn test_create_adapter_v2() {
        let adapter = create_adapter(&AdapterConfig::v2("http://localhost:5000")).unwrap();
        assert_eq!(adapter.registry_name(), "v2");
    }

    #[test]
    fn test_create_adapter_rejects_invalid_config() {
        let err = create_adapter(&AdapterConfig::default()).err().unwrap();
        assert!(matches!(err, ConfigError::MissingUrl { .. }));
    }

    #[cfg(not(feature = "ecr"))]
    #[test]
    fn test_create_adapter_ecr_needs_feature() {
        let config = AdapterConfig {
            registry: RegistryKind::Ecr,
            ..AdapterConfig::default()
        };
        let err = create_adapter(&config).err().unwrap();
        assert!(matches!(err, ConfigError::UnsupportedRegistry { .. }));
    }

    #[cfg(feature = "ecr")]
    #[test]
    fn test_create_adapter_ecr() {
        let config = AdapterConfig {
            registry: RegistryKind::Ecr,
            region: Some("us-east-1".to_string()),
            ..AdapterConfig::default()
        };
        let adapter = create_adapter(&config).unwrap();
        assert_eq!(adapter.registry_name(), "ecr");
    }
}
