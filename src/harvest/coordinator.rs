//! Harvest coordinator - run driver
//!
//! This module sequences a complete run:
//! - Fetching the seed document
//! - Extracting markdown links
//! - Downloading every linked document
//! - Writing the aggregated document and the failed URL manifest
//! - Reporting summary counters and timing

use crate::config::Config;
use crate::harvest::downloader::Downloader;
use crate::harvest::fetcher::{Fetcher, RetryPolicy};
use crate::harvest::links::extract_links;
use crate::harvest::progress::ProgressObserver;
use crate::output::{aggregate, write_failed_manifest, RunSummary};
use crate::state::RunState;
use crate::HarvestError;
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Drives a single harvest run through its states
pub struct Coordinator {
    config: Config,
    fetcher: Fetcher,
    base_url: Url,
    state: RunState,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The base URL is invalid or the HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let base_url = Url::parse(&config.source.base_url)?;
        let fetcher = Fetcher::from_config(&config.fetch)?;

        Ok(Self {
            config,
            fetcher,
            base_url,
            state: RunState::Init,
            cancel: CancellationToken::new(),
        })
    }

    /// Uses `token` to interrupt the run
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Replaces the retry policy derived from the configuration
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Result<Self, HarvestError> {
        let client = crate::harvest::fetcher::build_http_client(&self.config.fetch.user_agent)?;
        self.fetcher = Fetcher::new(client, policy);
        Ok(self)
    }

    /// Current state of the run
    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        if next.is_terminal() {
            tracing::info!("Run finished in state {}", next);
        } else {
            tracing::debug!("Run state {} -> {}", self.state, next);
        }
        self.state = next;
        Ok(())
    }

    /// Runs the harvest to completion
    ///
    /// Seed-level failures abort the run with an error; per-document
    /// failures never do. If the run is interrupted during the download
    /// phase, whatever finished is still aggregated and the unfinished URLs
    /// are listed in the failed manifest.
    pub async fn run(
        &mut self,
        progress: &mut dyn ProgressObserver,
    ) -> Result<RunSummary, HarvestError> {
        let start_time = Instant::now();
        let seed_url = self.config.source.seed_url.clone();

        tracing::info!("Starting documentation harvest");
        tracing::info!("Fetching seed document: {}", seed_url);

        let seed = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(HarvestError::Interrupted),
            seed = self.fetcher.fetch(&seed_url) => seed,
        };

        let Some(seed) = seed else {
            self.transition(RunState::AbortedNoSeed)?;
            tracing::error!("Failed to fetch the seed document. Exiting.");
            return Err(HarvestError::SeedUnavailable { url: seed_url });
        };
        self.transition(RunState::SeedFetched)?;

        let links = extract_links(Some(&seed), &self.base_url);
        if links.is_empty() {
            self.transition(RunState::AbortedNoLinks)?;
            tracing::warn!("No markdown links found. Exiting.");
            return Err(HarvestError::NoLinksFound { url: seed_url });
        }
        self.transition(RunState::LinksExtracted)?;
        tracing::info!("Found {} unique markdown links to download", links.len());

        self.transition(RunState::Downloading)?;
        let downloader = Downloader::new(
            self.fetcher.clone(),
            self.config.download.workers,
            &self.config.download.output_dir,
        );
        let report = downloader.download_all(&links, progress, &self.cancel).await?;

        let aggregate_path = PathBuf::from(&self.config.output.aggregate_path);
        tracing::info!("Aggregating content into {}", aggregate_path.display());
        aggregate(&report.succeeded, &aggregate_path, &self.config.output.title)?;
        self.transition(RunState::Aggregated)?;

        let failed_manifest_path = if report.failed.is_empty() {
            None
        } else {
            let path = PathBuf::from(&self.config.output.failed_path);
            write_failed_manifest(&path, &report.failed)?;
            tracing::info!("List of failed URLs saved to {}", path.display());
            Some(path)
        };

        let final_state = if report.cancelled {
            tracing::warn!("Process interrupted by user");
            RunState::Interrupted
        } else {
            RunState::Done
        };
        self.transition(final_state)?;

        let elapsed = start_time.elapsed();
        tracing::info!(
            "Aggregation complete. Output saved to {}",
            aggregate_path.display()
        );
        tracing::info!(
            "Total files processed: {}/{} ({} failed)",
            report.succeeded.len(),
            links.len(),
            report.failed.len()
        );
        tracing::info!("Total execution time: {:.2} seconds", elapsed.as_secs_f64());

        Ok(RunSummary {
            total_links: links.len(),
            succeeded: report.succeeded.len(),
            failed: report.failed.len(),
            write_errors: report.write_errors.len(),
            elapsed,
            aggregate_path,
            failed_manifest_path,
            final_state,
        })
    }
}

/// Runs a complete harvest operation
///
/// # Example
///
/// ```no_run
/// use doc_harvest::config::Config;
/// use doc_harvest::harvest::{run_harvest, SilentProgress};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_harvest(Config::default(), CancellationToken::new(), &mut SilentProgress).await?;
/// println!("{} documents", summary.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: Config,
    cancel: CancellationToken,
    progress: &mut dyn ProgressObserver,
) -> Result<RunSummary, HarvestError> {
    let mut coordinator = Coordinator::new(config)?.with_cancellation(cancel);
    coordinator.run(progress).await
}
