/// Run state definitions for tracking harvest progress
///
/// This module defines every stage a harvest run passes through, and which
/// stage may follow which.
use std::fmt;

/// Represents the current stage of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    // ===== Active States =====
    /// Nothing has been fetched yet
    Init,

    /// The seed document was downloaded
    SeedFetched,

    /// Markdown links were extracted from the seed document
    LinksExtracted,

    /// Linked documents are being downloaded
    Downloading,

    /// The aggregated document was written
    Aggregated,

    // ===== Terminal States =====
    /// Run finished normally
    Done,

    /// The seed document could not be fetched
    AbortedNoSeed,

    /// The seed document contained no markdown links
    AbortedNoLinks,

    /// The user interrupted the download phase; partial output was written
    Interrupted,
}

impl RunState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::AbortedNoSeed | Self::AbortedNoLinks | Self::Interrupted
        )
    }

    /// Returns true if `next` may directly follow this state
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::SeedFetched)
                | (Self::Init, Self::AbortedNoSeed)
                | (Self::SeedFetched, Self::LinksExtracted)
                | (Self::SeedFetched, Self::AbortedNoLinks)
                | (Self::LinksExtracted, Self::Downloading)
                | (Self::Downloading, Self::Aggregated)
                | (Self::Aggregated, Self::Done)
                | (Self::Aggregated, Self::Interrupted)
        )
    }

    /// Returns a short lowercase label for logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SeedFetched => "seed_fetched",
            Self::LinksExtracted => "links_extracted",
            Self::Downloading => "downloading",
            Self::Aggregated => "aggregated",
            Self::Done => "done",
            Self::AbortedNoSeed => "aborted_no_seed",
            Self::AbortedNoLinks => "aborted_no_links",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
