//! doc-harvest: A markdown documentation harvester
//!
//! This crate fetches a seed index document, follows the markdown links it
//! lists, downloads every linked file with bounded concurrency and
//! retry/backoff, and merges the results into a single document with a
//! generated table of contents.

pub mod config;
pub mod harvest;
pub mod logging;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for doc-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Seed document unavailable: {url}")]
    SeedUnavailable { url: String },

    #[error("No markdown links found in seed document {url}")]
    NoLinksFound { url: String },

    #[error("Interrupted before downloads started")]
    Interrupted,

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for doc-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvest::{run_harvest, Coordinator};
pub use output::RunSummary;
pub use state::RunState;
