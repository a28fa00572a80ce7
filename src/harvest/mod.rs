//! Harvest module for downloading linked documentation
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry and backoff
//! - Markdown link extraction from the seed document
//! - Bounded-concurrency download orchestration
//! - Progress reporting
//! - Overall run coordination

mod coordinator;
mod downloader;
mod fetcher;
mod links;
mod progress;

pub use coordinator::{run_harvest, Coordinator};
pub use downloader::{DocumentSource, DownloadRecord, DownloadReport, Downloader};
pub use fetcher::{
    build_http_client, AttemptError, FetchOutcome, FetchResult, Fetcher, RetryPolicy,
    MAX_BACKOFF_DELAY,
};
pub use links::{extract_links, LinkSet};
pub use progress::{
    observer_for, CounterProgress, ProgressObserver, RichProgress, SilentProgress,
};
