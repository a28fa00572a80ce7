use clap::ValueEnum;
use serde::Deserialize;

/// Browser-like user agent sent with every request unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

/// Main configuration structure for doc-harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub download: DownloadConfig,
    pub output: OutputConfig,
    pub progress: ProgressConfig,
}

/// Where the harvest starts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// URL of the seed index document listing the markdown files
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// Root that relative link targets are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            seed_url: "https://docs.p2p.org/llms.txt".to_string(),
            base_url: "https://docs.p2p.org/".to_string(),
        }
    }
}

/// Per-request retry and timeout policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Retries after the first attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Base of the exponential backoff (delay = base^attempt + jitter seconds)
    #[serde(rename = "backoff-base")]
    pub backoff_base: f64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout_secs: 10,
            backoff_base: 2.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Download orchestration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Maximum number of concurrent downloads
    pub workers: usize,

    /// Directory receiving one file per downloaded document
    #[serde(rename = "output-dir")]
    pub output_dir: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            output_dir: "markdown_files".to_string(),
        }
    }
}

/// Output artifact locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the aggregated markdown document
    #[serde(rename = "aggregate-path")]
    pub aggregate_path: String,

    /// Path to the failed URL manifest
    #[serde(rename = "failed-path")]
    pub failed_path: String,

    /// Path to the append-only run log
    #[serde(rename = "log-path")]
    pub log_path: String,

    /// Heading of the aggregated document
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            aggregate_path: "p2p_aggregated_docs.md".to_string(),
            failed_path: "failed_urls.txt".to_string(),
            log_path: "scraper.log".to_string(),
            title: "P2P.org Aggregated Documentation".to_string(),
        }
    }
}

/// Progress display configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub reporter: ProgressReporter,
}

/// How download progress is shown on the terminal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProgressReporter {
    /// No progress output
    Silent,
    /// Single-line percentage counter
    Counter,
    /// Animated progress bar
    #[default]
    Rich,
}
