//! Configuration module for doc-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section and key is optional; the defaults reproduce the stock P2P.org
//! documentation harvest.
//!
//! # Example
//!
//! ```no_run
//! use doc_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvest will use {} workers", config.download.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DownloadConfig, FetchConfig, OutputConfig, ProgressConfig, ProgressReporter,
    SourceConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
