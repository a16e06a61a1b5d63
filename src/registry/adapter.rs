//! Registry adapter over a vendor control plane
//!
//! `SpecAdapter` owns a lazily established control-plane client, lists
//! repositories page by page and drives the manifest fetcher for each
//! requested image. It is generic over the vendor session so every registry
//! shares the same listing, token and aggregation rules.

use crate::config::AdapterConfig;
use crate::domain::Spec;
use crate::error::RegistryError;
use crate::registry::manifest::ManifestFetcher;
use crate::registry::session::{repository_pages, ControlPlane, SessionFactory};
use crate::registry::{HttpClient, Partial, RegistryAdapter};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Registry adapter for any vendor session
pub struct SpecAdapter<S: SessionFactory> {
    config: AdapterConfig,
    session: S,
    http: HttpClient,
    client: OnceCell<S::Client>,
}

impl<S: SessionFactory> SpecAdapter<S> {
    /// Create a disconnected adapter
    pub fn new(config: AdapterConfig, session: S, http: HttpClient) -> Self {
        Self {
            config,
            session,
            http,
            client: OnceCell::new(),
        }
    }

    /// Configuration this adapter was created with
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Whether a session has been established
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    /// Establish the vendor session once and return the shared client
    ///
    /// Later calls return the same client without touching the session
    /// factory. A failed attempt leaves the adapter disconnected, so the next
    /// call tries again.
    pub async fn connect(&self) -> Result<&S::Client, RegistryError> {
        self.client
            .get_or_try_init(|| async {
                debug!(
                    registry = self.session.registry_name(),
                    "creating registry session"
                );
                self.session.connect().await.inspect_err(|e| {
                    error!(
                        registry = self.session.registry_name(),
                        error = %e,
                        "error creating registry session"
                    );
                })
            })
            .await
    }
}

#[async_trait]
impl<S: SessionFactory> RegistryAdapter for SpecAdapter<S> {
    fn registry_name(&self) -> &'static str {
        self.session.registry_name()
    }

    async fn get_image_names(&self) -> Partial<String> {
        debug!(
            registry = self.registry_name(),
            org = %self.config.org,
            "loading image list"
        );

        let client = match self.connect().await {
            Ok(client) => client,
            Err(e) => return Partial::failed(e),
        };

        let mut names = Vec::new();
        let mut pages = Box::pin(repository_pages(self.registry_name(), client));
        let mut page_count = 0usize;

        while let Some(page) = pages.next().await {
            match page {
                Ok(page) => {
                    page_count += 1;
                    names.extend(
                        page.repositories
                            .into_iter()
                            .filter(|name| self.config.in_org(name)),
                    );
                }
                Err(e) => {
                    warn!(
                        registry = self.registry_name(),
                        pages = page_count,
                        collected = names.len(),
                        error = %e,
                        "error while loading images, the catalog may be incomplete"
                    );
                    return Partial::interrupted(names, e);
                }
            }
        }

        info!(
            registry = self.registry_name(),
            pages = page_count,
            images = names.len(),
            "loaded image list"
        );
        Partial::complete(names)
    }

    async fn fetch_specs(&self, names: &[String]) -> Partial<Spec> {
        let client = match self.connect().await {
            Ok(client) => client,
            Err(e) => return Partial::failed(e),
        };

        // a fresh token for every batch; it may have expired since the last one
        let auth = match client.authorization_token().await {
            Ok(auth) => auth,
            Err(e) => {
                error!(
                    registry = self.registry_name(),
                    error = %e,
                    "unable to obtain authorization token"
                );
                return Partial::failed(e);
            }
        };

        let tag = self.config.effective_tag();
        let fetcher = ManifestFetcher::new(&self.http, &auth, tag);
        debug!(
            images = names.len(),
            tag,
            concurrency = self.config.concurrency,
            "fetching specs"
        );

        // nothing is requested until `buffered` polls a future; results come
        // back in input order and returning early drops in-flight fetches
        let pending: Vec<_> = names.iter().map(|name| fetcher.fetch_spec(name)).collect();
        let mut results = stream::iter(pending).buffered(self.config.concurrency.max(1));

        let mut specs = Vec::new();
        while let Some(result) = results.next().await {
            match result {
                Ok(Some(spec)) => specs.push(spec),
                Ok(None) => {}
                Err(e) => {
                    error!(
                        error = %e,
                        fetched = specs.len(),
                        "unable to retrieve spec data for image"
                    );
                    return Partial::interrupted(specs, e);
                }
            }
        }

        info!(
            registry = self.registry_name(),
            specs = specs.len(),
            images = names.len(),
            "fetched specs"
        );
        Partial::complete(specs)
    }
}
