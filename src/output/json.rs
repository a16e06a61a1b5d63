//! JSON output formatter for machine processing

use crate::domain::Spec;
use crate::orchestrator::{ScanError, ScanOutcome, ScanReport};
use crate::output::{OutputFormatter, Verbosity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbose output includes the full list of scanned images
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of a scan report
#[derive(Serialize)]
struct JsonOutput<'a> {
    registry: &'a str,
    tag: &'a str,
    scanned_at: DateTime<Utc>,
    outcome: ScanOutcome,
    summary: JsonSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<&'a [String]>,
    specs: &'a [Spec],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: &'a Vec<ScanError>,
}

#[derive(Serialize)]
struct JsonSummary {
    images: usize,
    specs: usize,
    errors: usize,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &ScanReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let output = JsonOutput {
            registry: &report.registry,
            tag: &report.tag,
            scanned_at: report.scanned_at,
            outcome: report.outcome(),
            summary: JsonSummary {
                images: report.images.len(),
                specs: report.specs.len(),
                errors: report.errors.len(),
            },
            images: (self.verbosity == Verbosity::Verbose).then_some(report.images.as_slice()),
            specs: &report.specs,
            errors: &report.errors,
        };

        serde_json::to_writer_pretty(&mut *writer, &output)?;
        writeln!(writer)
    }
}
