//! Download progress reporting
//!
//! The orchestrator reports every finished download to a
//! [`ProgressObserver`]. Which observer is used is decided once at startup
//! from the `[progress]` configuration section.

use crate::config::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;

/// Receives download progress ticks
pub trait ProgressObserver: Send {
    /// Called once before any download starts
    fn start(&mut self, total: usize);

    /// Called after each URL reaches a terminal outcome
    fn tick(&mut self, completed: usize, total: usize);

    /// Called once when the orchestrator is done, including after cancellation
    fn finish(&mut self);
}

/// Reports nothing
#[derive(Debug, Default)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn start(&mut self, _total: usize) {}

    fn tick(&mut self, _completed: usize, _total: usize) {}

    fn finish(&mut self) {}
}

/// Rewrites a single `Progress: P% (done/total)` line on stderr
#[derive(Debug, Default)]
pub struct CounterProgress;

impl ProgressObserver for CounterProgress {
    fn start(&mut self, total: usize) {
        eprintln!("Downloading {} files:", total);
    }

    fn tick(&mut self, completed: usize, total: usize) {
        let percent = if total == 0 {
            100.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\rProgress: {:.1}% ({}/{})", percent, completed, total);
        let _ = stderr.flush();
    }

    fn finish(&mut self) {
        eprintln!();
    }
}

/// Animated progress bar
#[derive(Debug, Default)]
pub struct RichProgress {
    bar: Option<ProgressBar>,
}

impl ProgressObserver for RichProgress {
    fn start(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message("Downloading files");
        self.bar = Some(bar);
    }

    fn tick(&mut self, completed: usize, _total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(completed as u64);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

/// Builds the observer selected by the configuration
pub fn observer_for(reporter: ProgressReporter) -> Box<dyn ProgressObserver> {
    match reporter {
        ProgressReporter::Silent => Box::new(SilentProgress),
        ProgressReporter::Counter => Box::new(CounterProgress),
        ProgressReporter::Rich => Box::new(RichProgress::default()),
    }
}
