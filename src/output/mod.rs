//! Output module for writing harvest results
//!
//! This module handles:
//! - The aggregated markdown document
//! - Individual document files and the failed URL manifest
//! - The end-of-run summary

mod aggregate;
mod files;
mod summary;

pub use aggregate::{aggregate, write_aggregate};
pub use files::{write_document, write_failed_manifest};
pub use summary::{format_summary, print_summary, RunSummary};
