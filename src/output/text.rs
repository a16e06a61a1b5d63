//! Text output formatter for human-readable display
//!
//! One line per spec found (name, runtime, plan count, image reference),
//! followed by errors and a summary line.

use crate::domain::Spec;
use crate::orchestrator::{ScanOutcome, ScanReport};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn plural(count: usize, word: &str) -> String {
        if count == 1 {
            format!("{} {}", count, word)
        } else {
            format!("{} {}s", count, word)
        }
    }

    fn format_header(&self, report: &ScanReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let header = format!(
            "{} registry, tag {} ({})",
            report.registry,
            report.tag,
            report.scanned_at.format("%Y/%m/%d %H:%M")
        );
        if self.color {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(writer)
    }

    fn format_spec(
        &self,
        spec: &Spec,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let plans = Self::plural(spec.plans.len(), "plan");
        let runtime = format!("runtime {}", spec.runtime);
        let bindable = if spec.bindable { " bindable" } else { "" };

        if self.color {
            let name_display = format!("{:width$}", spec.name, width = max_name_len);
            writeln!(
                writer,
                "  {} {} {}{} {}",
                name_display.bright_white().bold(),
                runtime.dimmed(),
                plans,
                bindable.cyan(),
                spec.image.dimmed()
            )?;
        } else {
            writeln!(
                writer,
                "  {:width$} {} {}{} {}",
                spec.name,
                runtime,
                plans,
                bindable,
                spec.image,
                width = max_name_len
            )?;
        }

        if self.verbosity == Verbosity::Verbose {
            if spec.display_name() != spec.name {
                writeln!(writer, "      {}", spec.display_name())?;
            }
            for plan in &spec.plans {
                let params = Self::plural(plan.parameters.len(), "parameter");
                if self.color {
                    writeln!(writer, "      {} {}", plan.name, format!("({})", params).dimmed())?;
                } else {
                    writeln!(writer, "      {} ({})", plan.name, params)?;
                }
            }
        }

        Ok(())
    }

    fn format_errors(&self, report: &ScanReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if report.errors.is_empty() {
            return Ok(());
        }

        if self.color {
            writeln!(writer, "{}:", "Errors".red().bold())?;
        } else {
            writeln!(writer, "Errors:")?;
        }
        for error in &report.errors {
            if self.color {
                writeln!(writer, "  {} {}", "✗".red(), error)?;
            } else {
                writeln!(writer, "  - {}", error)?;
            }
        }
        writeln!(writer)
    }

    fn format_summary(&self, report: &ScanReport, writer: &mut dyn Write) -> std::io::Result<()> {
        let specs = Self::plural(report.specs.len(), "spec");
        let mut images = Self::plural(report.images.len(), "image");

        let status = match report.outcome() {
            ScanOutcome::Complete => None,
            ScanOutcome::Partial => Some("incomplete"),
            ScanOutcome::Failed => Some("failed"),
        };
        // only a complete scan visited every image
        if status.is_none() && report.non_bundle_count() > 0 {
            images.push_str(&format!(", {} without a spec", report.non_bundle_count()));
        }

        if self.color {
            let status = status
                .map(|s| format!(" ({})", s).yellow().to_string())
                .unwrap_or_default();
            writeln!(
                writer,
                "{} in {}{}",
                specs.green(),
                images,
                status
            )
        } else {
            let status = status.map(|s| format!(" ({})", s)).unwrap_or_default();
            writeln!(writer, "{} in {}{}", specs, images, status)
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &ScanReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity == Verbosity::Quiet {
            return self.format_summary(report, writer);
        }

        self.format_header(report, writer)?;

        if !report.specs.is_empty() {
            let max_name_len = report
                .specs
                .iter()
                .map(|s| s.name.len())
                .max()
                .unwrap_or(0)
                .max(20);
            for spec in &report.specs {
                self.format_spec(spec, max_name_len, writer)?;
            }
            writeln!(writer)?;
        }

        self.format_errors(report, writer)?;
        self.format_summary(report, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;
    use crate::error::RegistryError;
    use crate::orchestrator::{Orchestrator, ScanOptions};
    use crate::registry::{Partial, RegistryAdapter};
    use async_trait::async_trait;

    struct FixedAdapter {
        fail_fetch: bool,
    }

    #[async_trait]
    impl RegistryAdapter for FixedAdapter {
        fn registry_name(&self) -> &'static str {
            "v2"
        }

        async fn get_image_names(&self) -> Partial<String> {
            Partial::complete(vec!["org/mediawiki-apb".to_string(), "org/nginx".to_string()])
        }

        async fn fetch_specs(&self, _names: &[String]) -> Partial<Spec> {
            let yaml = "name: mediawiki-apb\n\
                        plans:\n  - name: default\n    parameters:\n      - name: admin_user\n";
            let mut spec = Spec::from_yaml(yaml.as_bytes()).unwrap();
            spec.image = "localhost:5000/org/mediawiki-apb:latest".to_string();
            if self.fail_fetch {
                let failure = RegistryError::fetch("org/nginx", Some(500), "HTTP 500");
                Partial::interrupted(vec![spec], failure)
            } else {
                Partial::complete(vec![spec])
            }
        }
    }

    async fn report(fail_fetch: bool) -> ScanReport {
        Orchestrator::new(
            Box::new(FixedAdapter { fail_fetch }),
            &AdapterConfig::v2("http://localhost:5000"),
            ScanOptions::default(),
        )
        .run()
        .await
    }

    fn render(formatter: &TextFormatter, report: &ScanReport) -> String {
        let mut output = Vec::new();
        formatter.format(report, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn test_format_normal() {
        let report = report(false).await;
        let output = render(&TextFormatter::with_color(Verbosity::Normal, false), &report);

        assert!(output.starts_with("v2 registry, tag latest"));
        assert!(output.contains("mediawiki-apb"));
        assert!(output.contains("runtime 1 1 plan localhost:5000/org/mediawiki-apb:latest"));
        assert!(output.contains("1 spec in 2 images, 1 without a spec"));
        assert!(!output.contains("Errors"));
    }

    #[tokio::test]
    async fn test_format_verbose_lists_plans() {
        let report = report(false).await;
        let output = render(&TextFormatter::with_color(Verbosity::Verbose, false), &report);
        assert!(output.contains("default (1 parameter)"));
    }

    #[tokio::test]
    async fn test_format_quiet_summary_only() {
        let report = report(false).await;
        let output = render(&TextFormatter::with_color(Verbosity::Quiet, false), &report);
        assert_eq!(output, "1 spec in 2 images, 1 without a spec\n");
    }

    #[tokio::test]
    async fn test_format_errors() {
        let report = report(true).await;
        let output = render(&TextFormatter::with_color(Verbosity::Normal, false), &report);
        assert!(output.contains("Errors:"));
        assert!(output.contains("  - [fetch] failed to fetch manifest for image 'org/nginx'"));
        assert!(output.contains("1 spec in 2 images (incomplete)"));
        assert!(!output.contains("without a spec"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(TextFormatter::plural(1, "plan"), "1 plan");
        assert_eq!(TextFormatter::plural(0, "plan"), "0 plans");
    }
}
