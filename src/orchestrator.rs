//! Scan orchestrator for coordinating the list → fetch workflow
//!
//! This module provides:
//! - Workflow coordination: connect → list images → filter → fetch specs
//! - Continuation after a partial listing
//! - A report carrying everything found plus every error met on the way

use crate::config::AdapterConfig;
use crate::domain::Spec;
use crate::error::RegistryError;
use crate::progress::Progress;
use crate::registry::RegistryAdapter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// What to scan besides the adapter's own configuration
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Fetch just these images instead of listing the registry
    pub images: Vec<String>,
    /// Images to leave out of the fetch
    pub exclude: Vec<String>,
    /// Show progress spinners on stderr
    pub show_progress: bool,
}

/// Step of the workflow an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStage {
    Listing,
    Fetch,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStage::Listing => write!(f, "listing"),
            ScanStage::Fetch => write!(f, "fetch"),
        }
    }
}

/// An error recorded in a scan report
#[derive(Debug, Clone, Serialize)]
pub struct ScanError {
    pub stage: ScanStage,
    /// Error kind (connection, listing, auth, fetch, decode)
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub message: String,
}

impl ScanError {
    fn new(stage: ScanStage, error: &RegistryError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            image: error.image().map(str::to_string),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)
    }
}

/// Overall result of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOutcome {
    /// Everything was listed and fetched
    Complete,
    /// Some results are missing because of an error
    Partial,
    /// Nothing could be done (no session)
    Failed,
}

/// Everything a scan found
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub registry: String,
    pub tag: String,
    pub scanned_at: DateTime<Utc>,
    /// Image names considered for spec fetching, in registry order
    pub images: Vec<String>,
    pub specs: Vec<Spec>,
    pub errors: Vec<ScanError>,
}

impl ScanReport {
    fn new(registry: &str, tag: &str) -> Self {
        Self {
            registry: registry.to_string(),
            tag: tag.to_string(),
            scanned_at: Utc::now(),
            images: Vec::new(),
            specs: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Classify the scan by the errors it recorded
    pub fn outcome(&self) -> ScanOutcome {
        if self.errors.iter().any(|e| e.kind == "connection") {
            ScanOutcome::Failed
        } else if self.errors.is_empty() {
            ScanOutcome::Complete
        } else {
            ScanOutcome::Partial
        }
    }

    /// Number of images found not to carry a spec
    ///
    /// Only meaningful for complete scans; an interrupted fetch leaves
    /// some images unvisited.
    pub fn non_bundle_count(&self) -> usize {
        self.images.len().saturating_sub(self.specs.len())
    }
}

/// Orchestrator for one registry scan
pub struct Orchestrator {
    adapter: Box<dyn RegistryAdapter>,
    tag: String,
    options: ScanOptions,
}

impl Orchestrator {
    /// Create an orchestrator driving the given adapter
    pub fn new(
        adapter: Box<dyn RegistryAdapter>,
        config: &AdapterConfig,
        options: ScanOptions,
    ) -> Self {
        Self {
            adapter,
            tag: config.effective_tag().to_string(),
            options,
        }
    }

    /// Run the scan workflow
    pub async fn run(&self) -> ScanReport {
        let mut progress = Progress::new(self.options.show_progress);
        let mut report = ScanReport::new(self.adapter.registry_name(), &self.tag);

        // Step 1: Decide which images to look at
        let mut names = if self.options.images.is_empty() {
            progress.spinner(&format!("Listing images in {} registry...", report.registry));
            let listing = self.adapter.get_image_names().await;
            progress.finish_and_clear();

            let (names, error) = listing.into_parts();
            if let Some(e) = error {
                let fatal = matches!(e, RegistryError::Connection { .. });
                report.errors.push(ScanError::new(ScanStage::Listing, &e));
                if fatal {
                    return report;
                }
                warn!(images = names.len(), "continuing with a partial image list");
            }
            names
        } else {
            self.options.images.clone()
        };

        // Step 2: Apply exclusions
        names.retain(|name| !self.options.exclude.contains(name));
        report.images = names;

        if report.images.is_empty() {
            info!("no images to fetch");
            return report;
        }

        // Step 3: Fetch specs
        progress.spinner(&format!(
            "Fetching specs for {} images (tag {})...",
            report.images.len(),
            self.tag
        ));
        let fetched = self.adapter.fetch_specs(&report.images).await;
        progress.finish_and_clear();

        let (specs, error) = fetched.into_parts();
        report.specs = specs;
        if let Some(e) = error {
            report.errors.push(ScanError::new(ScanStage::Fetch, &e));
        }

        report
    }
}
