//! Link target resolution

use url::Url;

/// Returns true if the target already carries an `http://` or `https://` prefix
pub fn is_absolute_http(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Resolves a markdown link target to an absolute URL string
///
/// Absolute http(s) targets are returned verbatim, without normalization, so
/// that the exact URL listed in the seed document is the one downloaded and
/// reported. Anything else is joined onto `base_url` following RFC 3986
/// reference resolution.
///
/// # Returns
///
/// * `Some(String)` - The absolute URL
/// * `None` - The target could not be joined onto the base
///
/// # Example
///
/// ```
/// use doc_harvest::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://docs.p2p.org/").unwrap();
/// assert_eq!(
///     resolve_link("staking/intro.md", &base).as_deref(),
///     Some("https://docs.p2p.org/staking/intro.md")
/// );
/// ```
pub fn resolve_link(target: &str, base_url: &Url) -> Option<String> {
    if is_absolute_http(target) {
        return Some(target.to_string());
    }

    match base_url.join(target) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            tracing::debug!(link = target, error = %e, "Skipping unresolvable link target");
            None
        }
    }
}
