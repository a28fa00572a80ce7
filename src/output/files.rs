//! Individual document files and the failed URL manifest

use crate::url::file_name_from_url;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes a downloaded document to `<dir>/<last path segment of url>`
///
/// Existing files are overwritten. Returns the path written.
pub async fn write_document(dir: &Path, url: &str, content: &str) -> std::io::Result<PathBuf> {
    let file_name = file_name_from_url(url);
    if file_name.is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("URL has no file name: {}", url),
        ));
    }

    let path = dir.join(file_name);
    tokio::fs::write(&path, content).await?;
    Ok(path)
}

/// Writes one failed URL per line, replacing any previous manifest
pub fn write_failed_manifest(path: &Path, urls: &[String]) -> std::io::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for url in urls {
        writeln!(file, "{}", url)?;
    }
    file.flush()
}
