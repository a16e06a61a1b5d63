//! CLI argument parsing module for specscan

use crate::config::{AdapterConfig, RegistryKind};
use crate::error::ConfigError;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// List container images in a registry and read the bundle specs embedded in their manifests
#[derive(Parser, Debug, Clone)]
#[command(
    name = "specscan",
    version,
    about = "Scan a container registry for bundle specs"
)]
pub struct CliArgs {
    // Registry selection
    /// Registry vendor to talk to
    #[arg(long, value_enum)]
    pub registry: Option<RegistryKind>,

    /// Registry base URL (e.g. https://registry.example.com)
    #[arg(long)]
    pub url: Option<String>,

    /// Only consider repositories in this organization/namespace
    #[arg(long)]
    pub org: Option<String>,

    /// Image tag to read manifests from (default: latest)
    #[arg(long)]
    pub tag: Option<String>,

    /// Registry username
    #[arg(short, long)]
    pub username: Option<String>,

    /// Registry password
    #[arg(long, env = "SPECSCAN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// AWS region (ecr only)
    #[arg(long)]
    pub region: Option<String>,

    // Tuning
    /// Repositories requested per catalog page
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Number of manifests fetched at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Read settings from a TOML file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    // Image filters
    /// Fetch only this image instead of listing the registry (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub image: Vec<String>,

    /// Exclude an image from the scan (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub exclude: Vec<String>,

    // Output options
    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CliArgs {
    /// Build the adapter configuration from the config file (if any) and flags
    pub fn adapter_config(&self) -> Result<AdapterConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => AdapterConfig::from_file(path)?,
            None => AdapterConfig::default(),
        };
        let config = self.apply_overrides(base);
        config.validate()?;
        Ok(config)
    }

    /// Apply flags on top of an existing configuration
    pub fn apply_overrides(&self, mut config: AdapterConfig) -> AdapterConfig {
        if let Some(registry) = self.registry {
            config.registry = registry;
        }
        if let Some(url) = &self.url {
            config.url = Some(url.clone());
        }
        if let Some(org) = &self.org {
            config.org = org.clone();
        }
        if let Some(tag) = &self.tag {
            config.tag = tag.clone();
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        config
    }

    /// Whether spinners should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["specscan"]);
        assert!(args.registry.is_none());
        assert!(args.url.is_none());
        assert!(args.config.is_none());
        assert!(args.image.is_empty());
        assert!(args.exclude.is_empty());
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_registry_flag() {
        let args = CliArgs::parse_from(["specscan", "--registry", "ecr"]);
        assert_eq!(args.registry, Some(RegistryKind::Ecr));

        let args = CliArgs::parse_from(["specscan", "--registry", "v2"]);
        assert_eq!(args.registry, Some(RegistryKind::V2));
    }

    #[test]
    fn test_unknown_registry_rejected() {
        assert!(CliArgs::try_parse_from(["specscan", "--registry", "quay"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(CliArgs::try_parse_from(["specscan", "--verbose", "--quiet"]).is_err());
    }

    #[test]
    fn test_image_and_exclude_multiple() {
        let args = CliArgs::parse_from([
            "specscan", "--image", "a", "--image", "b", "--exclude", "c",
        ]);
        assert_eq!(args.image, vec!["a", "b"]);
        assert_eq!(args.exclude, vec!["c"]);
    }

    #[test]
    fn test_adapter_config_from_flags() {
        let args = CliArgs::parse_from([
            "specscan",
            "--url",
            "http://localhost:5000",
            "--org",
            "bundles",
            "--tag",
            "canary",
            "-j",
            "4",
            "--timeout",
            "5",
        ]);
        let config = args.adapter_config().unwrap();
        assert_eq!(config.registry, RegistryKind::V2);
        assert_eq!(config.url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(config.org, "bundles");
        assert_eq!(config.effective_tag(), "canary");
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_adapter_config_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "url = \"http://file.example.com\"\norg = \"from-file\"\npage_size = 10"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = CliArgs::parse_from(["specscan", "--config", &path, "--org", "from-cli"]);
        let config = args.adapter_config().unwrap();
        assert_eq!(config.url.as_deref(), Some("http://file.example.com"));
        assert_eq!(config.org, "from-cli");
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn test_adapter_config_requires_url_for_v2() {
        let args = CliArgs::parse_from(["specscan"]);
        assert!(matches!(
            args.adapter_config(),
            Err(ConfigError::MissingUrl { .. })
        ));
    }

    #[test]
    fn test_show_progress() {
        assert!(CliArgs::parse_from(["specscan"]).show_progress());
        assert!(!CliArgs::parse_from(["specscan", "--json"]).show_progress());
        assert!(!CliArgs::parse_from(["specscan", "-q"]).show_progress());
    }
}
