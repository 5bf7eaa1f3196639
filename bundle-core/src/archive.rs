//! Output packaging
//!
//! Serializes the collected output entries into a single ZIP archive for
//! download. Paths use forward slashes; a path produced twice in one run
//! (same SKU appearing in two rows) is written once, first entry wins.

use crate::error::Result;
use crate::types::OutputEntry;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use tracing::warn;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name of the produced archive
pub const ARCHIVE_FILENAME: &str = "bundle_images.zip";

/// Build a deflate-compressed ZIP of all output entries.
pub fn build_archive(entries: &[OutputEntry]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut seen: HashSet<&str> = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.relative_path.as_str()) {
            warn!(path = %entry.relative_path, "Duplicate output path, keeping first");
            continue;
        }
        writer.start_file(entry.relative_path.as_str(), options)?;
        writer.write_all(&entry.bytes)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
