//! URL handling module for doc-harvest
//!
//! This module resolves link targets against the documentation root and
//! derives file names, section titles and anchors from document URLs.

mod naming;
mod resolve;

// Re-export main functions
pub use naming::{anchor_for_title, file_name_from_url, title_from_url};
pub use resolve::{is_absolute_http, resolve_link};
