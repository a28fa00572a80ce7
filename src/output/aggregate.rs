//! Aggregated document generation
//!
//! This module merges every downloaded document into one markdown file with
//! a title, a summary line, a table of contents, and one section per
//! document with its source URL.

use crate::harvest::DownloadRecord;
use crate::url::{anchor_for_title, title_from_url};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the aggregated document to `output_path`, replacing any existing file
///
/// Sections appear in the order of `records`. Records without content are
/// skipped.
///
/// # Arguments
///
/// * `records` - Downloaded documents, normally in completion order
/// * `output_path` - Path where the markdown file should be written
/// * `title` - Top-level heading of the document
pub fn aggregate(records: &[DownloadRecord], output_path: &Path, title: &str) -> std::io::Result<()> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    write_aggregate(&mut writer, records, title, &generated_at)?;
    writer.flush()
}

/// Streams the aggregated document into `out`
///
/// `generated_at` is written verbatim into the summary block.
pub fn write_aggregate<W: Write>(
    out: &mut W,
    records: &[DownloadRecord],
    title: &str,
    generated_at: &str,
) -> std::io::Result<()> {
    let sections: Vec<(String, &str, &str)> = records
        .iter()
        .filter_map(|record| {
            record
                .content
                .as_deref()
                .map(|content| (title_from_url(&record.url), record.url.as_str(), content))
        })
        .collect();

    warn_on_title_collisions(&sections);

    // Title and summary
    write!(out, "# {}\n\n", title)?;
    write!(
        out,
        "*This file contains aggregated documentation from {} markdown files.*\n\n",
        sections.len()
    )?;
    write!(out, "*Generated on: {}*\n\n", generated_at)?;

    // Table of contents
    out.write_all(b"## Table of Contents\n\n")?;
    for (i, (section_title, _, _)) in sections.iter().enumerate() {
        writeln!(
            out,
            "{}. [{}](#{})",
            i + 1,
            section_title,
            anchor_for_title(section_title)
        )?;
    }
    out.write_all(b"\n---\n\n")?;

    // Sections
    for (section_title, url, content) in &sections {
        write!(out, "## {}\n\n", section_title)?;
        write!(out, "*Source: [{}]({})*\n\n", url, url)?;
        out.write_all(content.as_bytes())?;
        out.write_all(b"\n\n---\n\n")?;
    }

    Ok(())
}

/// Logs every section title shared by more than one URL
///
/// Their anchors are identical, so the table of contents cannot tell them
/// apart.
fn warn_on_title_collisions(sections: &[(String, &str, &str)]) {
    let mut by_title: HashMap<&str, Vec<&str>> = HashMap::new();
    for (section_title, url, _) in sections {
        by_title.entry(section_title.as_str()).or_default().push(*url);
    }

    for (section_title, urls) in by_title {
        if urls.len() > 1 {
            tracing::warn!(
                "Section title '{}' is shared by {} documents: {}",
                section_title,
                urls.len(),
                urls.join(", ")
            );
        }
    }
}
