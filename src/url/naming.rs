//! File names, section titles and anchors derived from document URLs

/// Returns the last path segment of a URL: everything after the final `/`
///
/// Query strings and fragments are not stripped.
pub fn file_name_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Derives a human-readable section title from a document URL
///
/// The file name has every `.md` removed, hyphens become spaces, and the
/// result is title-cased: a letter is upper-cased when it starts a run of
/// letters and lower-cased otherwise.
///
/// # Example
///
/// ```
/// use doc_harvest::url::title_from_url;
///
/// assert_eq!(title_from_url("https://docs.p2p.org/foo-bar.md"), "Foo Bar");
/// ```
pub fn title_from_url(url: &str) -> String {
    let stem = file_name_from_url(url).replace(".md", "").replace('-', " ");
    title_case(&stem)
}

/// Converts a title into its table-of-contents anchor
pub fn anchor_for_title(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }

    out
}
