//! Manifest retrieval and spec extraction
//!
//! Fetches `{endpoint}/v2/{image}/manifests/{tag}` and reads the bundle spec
//! out of the image labels recorded in the schema 1 manifest history:
//!
//! ```text
//! manifest.history[0].v1Compatibility  (JSON string)
//!   └─ config.Labels["com.redhat.apb.spec"]     base64(YAML spec)
//!   └─ config.Labels["com.redhat.apb.runtime"]  runtime version, optional
//! ```

use crate::domain::{Spec, DEFAULT_RUNTIME};
use crate::error::RegistryError;
use crate::registry::session::AuthorizationData;
use crate::registry::HttpClient;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Label holding the base64-encoded spec document
pub const BUNDLE_SPEC_LABEL: &str = "com.redhat.apb.spec";

/// Label holding the bundle runtime version
pub const BUNDLE_RUNTIME_LABEL: &str = "com.redhat.apb.runtime";

/// Manifest media types that carry v1 history with image labels
const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v1+prettyjws, \
application/vnd.docker.distribution.manifest.v1+json, application/json";

/// Schema 1 manifest, reduced to the history we read labels from
#[derive(Debug, Deserialize)]
struct SignedManifest {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(rename = "v1Compatibility", default)]
    v1_compatibility: String,
}

#[derive(Debug, Deserialize)]
struct V1Compatibility {
    config: Option<ContainerConfig>,
}

#[derive(Debug, Deserialize)]
struct ContainerConfig {
    #[serde(rename = "Labels")]
    labels: Option<HashMap<String, String>>,
}

/// Retrieves manifests with one authorization token and decodes their specs
#[derive(Debug)]
pub struct ManifestFetcher<'a> {
    client: &'a HttpClient,
    auth: &'a AuthorizationData,
    tag: &'a str,
}

impl<'a> ManifestFetcher<'a> {
    pub fn new(client: &'a HttpClient, auth: &'a AuthorizationData, tag: &'a str) -> Self {
        Self { client, auth, tag }
    }

    /// Manifest URL for an image at this fetcher's tag
    pub fn manifest_url(&self, image: &str) -> String {
        manifest_url(&self.auth.endpoint, image, self.tag)
    }

    /// Fetch one image's manifest and extract its spec
    ///
    /// `Ok(None)` means the image carries no spec label.
    pub async fn fetch_spec(&self, image: &str) -> Result<Option<Spec>, RegistryError> {
        let url = self.manifest_url(image);
        debug!(image, url = %url, "fetching manifest");

        let body = self
            .client
            .get_bytes(&url, self.request_headers(image)?)
            .await
            .map_err(|e| RegistryError::fetch(image, e.status(), e.to_string()))?;

        let reference = image_reference(&self.auth.endpoint, image, self.tag);
        extract_spec(&body, image, &reference)
    }

    fn request_headers(&self, image: &str) -> Result<HeaderMap, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MANIFEST_ACCEPT));
        if let Some(token) = &self.auth.token {
            // the token is placed exactly as the registry issued it
            let value = HeaderValue::from_str(&format!("Basic {}", token)).map_err(|e| {
                RegistryError::fetch(image, None, format!("unusable authorization token: {}", e))
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

/// Build `{endpoint}/v2/{image}/manifests/{tag}`
pub fn manifest_url(endpoint: &str, image: &str, tag: &str) -> String {
    format!(
        "{}/v2/{}/manifests/{}",
        endpoint.trim_end_matches('/'),
        image,
        tag
    )
}

/// Pullable reference `{host[:port]}/{image}:{tag}` for an endpoint
pub fn image_reference(endpoint: &str, image: &str, tag: &str) -> String {
    let host = Url::parse(endpoint)
        .ok()
        .and_then(|url| {
            url.host_str().map(|host| match url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            })
        })
        .unwrap_or_else(|| endpoint.trim_end_matches('/').to_string());
    format!("{}/{}:{}", host, image, tag)
}

/// Decode a manifest body into the spec it embeds
///
/// Missing history, config, labels or spec label is not an error: the
/// image simply is not a bundle. A present but malformed label is.
pub fn extract_spec(
    body: &[u8],
    image: &str,
    reference: &str,
) -> Result<Option<Spec>, RegistryError> {
    let manifest: SignedManifest = serde_json::from_slice(body)
        .map_err(|e| RegistryError::decode(image, format!("invalid manifest: {}", e)))?;

    let Some(entry) = manifest.history.first() else {
        debug!(image, "manifest has no v1 history, skipping");
        return Ok(None);
    };
    if entry.v1_compatibility.is_empty() {
        debug!(image, "manifest history has no v1Compatibility entry, skipping");
        return Ok(None);
    }

    let compat: V1Compatibility = serde_json::from_str(&entry.v1_compatibility)
        .map_err(|e| RegistryError::decode(image, format!("invalid v1Compatibility: {}", e)))?;

    let Some(labels) = compat.config.and_then(|c| c.labels) else {
        debug!(image, "image has no labels, skipping");
        return Ok(None);
    };
    let Some(encoded) = labels.get(BUNDLE_SPEC_LABEL).filter(|v| !v.is_empty()) else {
        debug!(image, label = BUNDLE_SPEC_LABEL, "spec label not found, skipping");
        return Ok(None);
    };

    let document = STANDARD
        .decode(encoded.trim())
        .map_err(|e| RegistryError::decode(image, format!("spec label is not base64: {}", e)))?;
    let mut spec = Spec::from_yaml(&document)
        .map_err(|e| RegistryError::decode(image, format!("invalid spec document: {}", e)))?;

    spec.runtime = runtime_version(labels.get(BUNDLE_RUNTIME_LABEL).map(String::as_str))
        .map_err(|message| RegistryError::decode(image, message))?;
    if !spec.image.is_empty() && spec.image != reference {
        warn!(
            image,
            declared = %spec.image,
            "spec declares a different image, using fetched reference"
        );
    }
    spec.image = reference.to_string();

    Ok(Some(spec))
}

/// Runtime version from the runtime label; absent means the default
fn runtime_version(label: Option<&str>) -> Result<u32, String> {
    match label.map(str::trim) {
        None | Some("") => Ok(DEFAULT_RUNTIME),
        Some(value) => value
            .parse()
            .map_err(|_| format!("invalid runtime label '{}'", value)),
    }
}
