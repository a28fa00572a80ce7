//! Markdown link extraction
//!
//! The seed document is plain text listing documentation pages as inline
//! markdown links. Only links whose target ends in `.md` are harvested.

use crate::url::resolve_link;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

/// Set of absolute document URLs extracted from a seed document
pub type LinkSet = BTreeSet<String>;

/// `[label](target.md)`, non-greedy on both label and target
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]\((.*?\.md)\)").unwrap());

/// Extracts every markdown link to a `.md` file from `text`
///
/// Relative targets are resolved against `base_url`; absolute http(s)
/// targets are kept as written. Duplicates collapse into one entry.
///
/// # Example
///
/// ```
/// use doc_harvest::harvest::extract_links;
/// use url::Url;
///
/// let base = Url::parse("https://docs.p2p.org/").unwrap();
/// let links = extract_links(Some("[A](a.md) [B](https://x/b.md) [A2](a.md)"), &base);
/// assert_eq!(links.len(), 2);
/// assert!(links.contains("https://docs.p2p.org/a.md"));
/// assert!(links.contains("https://x/b.md"));
/// ```
pub fn extract_links(text: Option<&str>, base_url: &Url) -> LinkSet {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return LinkSet::new();
    };

    let links: LinkSet = MD_LINK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|target| resolve_link(target.as_str(), base_url))
        .collect();

    tracing::info!("Found {} unique markdown links", links.len());
    links
}
