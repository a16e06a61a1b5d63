//! Amazon Elastic Container Registry control plane
//!
//! Sessions come from the ambient AWS configuration (environment, profile,
//! instance metadata). Listing uses `DescribeRepositories` pages and tokens
//! come from `GetAuthorizationToken`, whose proxy endpoint serves the v2
//! manifest API.

use crate::config::AdapterConfig;
use crate::error::RegistryError;
use crate::registry::session::{AuthorizationData, ControlPlane, RepositoryPage, SessionFactory};
use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_ecr::config::Region;
use aws_sdk_ecr::error::DisplayErrorContext;
use tracing::debug;

/// Adapter name for ECR
pub const REGISTRY_NAME: &str = "ecr";

/// Upper bound ECR accepts for `maxResults`
const MAX_PAGE_SIZE: usize = 1000;

/// Session factory backed by the AWS SDK
#[derive(Clone, Debug, Default)]
pub struct EcrSession {
    region: Option<String>,
    page_size: usize,
}

impl EcrSession {
    pub fn new(region: Option<String>, page_size: usize) -> Self {
        Self { region, page_size }
    }

    /// Build a session from adapter configuration
    pub fn from_config(config: &AdapterConfig) -> Self {
        Self::new(config.region.clone(), config.page_size)
    }
}

#[async_trait]
impl SessionFactory for EcrSession {
    type Client = EcrClient;

    fn registry_name(&self) -> &'static str {
        REGISTRY_NAME
    }

    async fn connect(&self) -> Result<EcrClient, RegistryError> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let region = sdk_config
            .region()
            .ok_or_else(|| RegistryError::connection(REGISTRY_NAME, "no AWS region configured"))?;
        let provider = sdk_config.credentials_provider().ok_or_else(|| {
            RegistryError::connection(REGISTRY_NAME, "no AWS credentials provider configured")
        })?;
        provider
            .provide_credentials()
            .await
            .map_err(|e| {
                RegistryError::connection(REGISTRY_NAME, DisplayErrorContext(&e).to_string())
            })?;

        debug!(region = %region, "created AWS session");

        Ok(EcrClient {
            client: aws_sdk_ecr::Client::new(&sdk_config),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }
}

/// Connected ECR client
#[derive(Clone, Debug)]
pub struct EcrClient {
    client: aws_sdk_ecr::Client,
    page_size: usize,
}

#[async_trait]
impl ControlPlane for EcrClient {
    async fn list_repositories(
        &self,
        cursor: Option<&str>,
    ) -> Result<RepositoryPage, RegistryError> {
        let output = self
            .client
            .describe_repositories()
            .set_next_token(cursor.map(str::to_string))
            .max_results(self.page_size as i32)
            .send()
            .await
            .map_err(|e| {
                RegistryError::listing(REGISTRY_NAME, DisplayErrorContext(&e).to_string())
            })?;

        let repositories = output
            .repositories()
            .iter()
            .filter_map(|r| r.repository_name().map(str::to_string))
            .collect();

        Ok(RepositoryPage::new(
            repositories,
            output.next_token().map(str::to_string),
        ))
    }

    async fn authorization_token(&self) -> Result<AuthorizationData, RegistryError> {
        let output = self
            .client
            .get_authorization_token()
            .send()
            .await
            .map_err(|e| {
                RegistryError::auth(REGISTRY_NAME, DisplayErrorContext(&e).to_string())
            })?;

        let data = output.authorization_data().first().ok_or_else(|| {
            RegistryError::auth(REGISTRY_NAME, "response carried no authorization data")
        })?;
        let token = data
            .authorization_token()
            .ok_or_else(|| RegistryError::auth(REGISTRY_NAME, "response carried no token"))?;
        let endpoint = data.proxy_endpoint().ok_or_else(|| {
            RegistryError::auth(REGISTRY_NAME, "response carried no proxy endpoint")
        })?;

        Ok(AuthorizationData::new(Some(token.to_string()), endpoint))
    }
}
