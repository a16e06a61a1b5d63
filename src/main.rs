//! specscan - container registry bundle spec scanner
//!
//! Lists the images in a registry (Docker Registry v2, or Amazon ECR with the
//! `ecr` feature) and reads the bundle spec embedded in each image's
//! manifest labels.

use anyhow::Context;
use clap::Parser;
use specscan::cli::CliArgs;
use specscan::logging::init_tracing;
use specscan::orchestrator::{Orchestrator, ScanOptions, ScanOutcome};
use specscan::output::{create_formatter, OutputConfig};
use specscan::registry::create_adapter;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose, args.quiet);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let config = args.adapter_config().context("invalid configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if args.verbose {
        eprintln!("specscan v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Registry: {}", config.registry);
        if let Some(url) = &config.url {
            eprintln!("URL: {}", url);
        }
    }

    let adapter = create_adapter(&config)?;
    let options = ScanOptions {
        images: args.image.clone(),
        exclude: args.exclude.clone(),
        show_progress: args.show_progress(),
    };
    let report = Orchestrator::new(adapter, &config, options).run().await;

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet);
    let formatter = create_formatter(output_config);

    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    Ok(match report.outcome() {
        ScanOutcome::Complete => ExitCode::SUCCESS,
        // Partial results are still printed
        ScanOutcome::Partial => ExitCode::from(2),
        ScanOutcome::Failed => ExitCode::FAILURE,
    })
}
