//! End-of-run summary
//!
//! This module holds the counters a finished run reports and renders them
//! for the terminal.

use crate::state::RunState;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a complete harvest run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Number of unique markdown links found in the seed document
    pub total_links: usize,

    /// Documents downloaded
    pub succeeded: usize,

    /// URLs that could not be downloaded
    pub failed: usize,

    /// Documents downloaded but not saved individually
    pub write_errors: usize,

    /// Wall-clock time of the whole run
    pub elapsed: Duration,

    /// Where the aggregated document was written
    pub aggregate_path: PathBuf,

    /// Where the failed URL manifest was written, if any URL failed
    pub failed_manifest_path: Option<PathBuf>,

    /// State the run ended in
    pub final_state: RunState,
}

/// Formats the human-readable summary printed at the end of a run
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    if summary.final_state == RunState::Interrupted {
        out.push_str("\nProcess interrupted by user. Partial results were saved.\n");
    }

    out.push_str(&format!(
        "\nDone! Output saved to {}\n",
        summary.aggregate_path.display()
    ));
    out.push_str(&format!(
        "Successfully processed {} out of {} files in {:.2} seconds\n",
        summary.succeeded,
        summary.total_links,
        summary.elapsed.as_secs_f64()
    ));

    if let Some(path) = &summary.failed_manifest_path {
        out.push_str(&format!(
            "Failed to download {} files. See {} for details.\n",
            summary.failed,
            path.display()
        ));
    }

    if summary.write_errors > 0 {
        out.push_str(&format!(
            "{} files could not be saved individually. See the log for details.\n",
            summary.write_errors
        ));
    }

    out
}

/// Prints the run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    print!("{}", format_summary(summary));
}
