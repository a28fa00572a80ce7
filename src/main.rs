//! doc-harvest main entry point
//!
//! This is the command-line interface for the doc-harvest documentation harvester.

use anyhow::Context;
use clap::Parser;
use doc_harvest::config::{load_config_with_hash, validate, Config, ProgressReporter};
use doc_harvest::harvest::{observer_for, Coordinator};
use doc_harvest::output::print_summary;
use doc_harvest::{logging, HarvestError};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

/// doc-harvest: A markdown documentation harvester
///
/// Fetches a seed index, downloads every markdown document it links to, and
/// merges them into a single document with a table of contents.
#[derive(Parser, Debug)]
#[command(name = "doc-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A markdown documentation harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the seed document URL
    #[arg(long, value_name = "URL")]
    seed_url: Option<String>,

    /// Override the number of concurrent downloads
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Progress display
    #[arg(long, value_enum)]
    progress: Option<ProgressReporter>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without downloading
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_hash) = match resolve_config(&cli) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return ExitCode::SUCCESS;
    }

    let _log_guard = match logging::init(
        std::path::Path::new(&config.output.log_path),
        cli.verbose,
        cli.quiet,
    ) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to set up logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(hash) = config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    match handle_harvest(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(HarvestError::Interrupted) = e.downcast_ref::<HarvestError>() {
                tracing::warn!("Process interrupted by user");
                println!("\nProcess interrupted by user. Exiting...");
                return ExitCode::SUCCESS;
            }
            tracing::error!("An unexpected error occurred: {:#}", e);
            println!("\nAn unexpected error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(seed_url) = &cli.seed_url {
        config.source.seed_url = seed_url.clone();
    }
    if let Some(workers) = cli.workers {
        config.download.workers = workers;
    }
    if let Some(reporter) = cli.progress {
        config.progress.reporter = reporter;
    }
    if cli.quiet {
        config.progress.reporter = ProgressReporter::Silent;
    }

    validate(&config).context("Invalid configuration")?;

    Ok((config, hash))
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== doc-harvest Dry Run ===\n");

    println!("Source:");
    println!("  Seed URL: {}", config.source.seed_url);
    println!("  Base URL: {}", config.source.base_url);

    println!("\nFetch Policy:");
    println!("  Max retries: {}", config.fetch.max_retries);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Backoff base: {}", config.fetch.backoff_base);
    println!("  User agent: {}", config.fetch.user_agent);

    println!("\nDownload:");
    println!("  Workers: {}", config.download.workers);
    println!("  Output directory: {}", config.download.output_dir);

    println!("\nOutput:");
    println!("  Aggregate: {}", config.output.aggregate_path);
    println!("  Failed manifest: {}", config.output.failed_path);
    println!("  Run log: {}", config.output.log_path);
    println!("  Title: {}", config.output.title);

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Received Ctrl+C, stopping downloads");
                interrupt.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
        }
    });

    let mut progress = observer_for(config.progress.reporter);
    let mut coordinator = Coordinator::new(config)?.with_cancellation(cancel);

    match coordinator.run(progress.as_mut()).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e @ (HarvestError::SeedUnavailable { .. } | HarvestError::NoLinksFound { .. })) => {
            println!("\n{}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
