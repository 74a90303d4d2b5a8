use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use crate::error::{Error, Result};
use crate::options::{EscapePolicy, ExtractOptions};
use crate::report::{ExtractReport, ExtractedEntry};
use crate::sanitize::sanitize_path;

/// Open the zip at `archive` and extract it into `destination`.
pub fn extract_zip_file(archive: &Path, destination: &Path, options: &ExtractOptions) -> Result<ExtractReport> {
    let file = File::open(archive).map_err(|source| Error::ExtractionFailed {
        path: archive.to_path_buf(),
        source,
    })?;
    extract_zip(BufReader::new(file), destination, options)
}

/// Stream every entry of a zip archive into `destination`.
///
/// Entries are written one at a time; nothing is staged, so a failure part
/// way leaves the entries extracted so far in place.
pub fn extract_zip<R: Read + Seek>(reader: R, destination: &Path, options: &ExtractOptions) -> Result<ExtractReport> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| Error::Corrupted(e.to_string()))?;
    let mut report = ExtractReport::default();

    std::fs::create_dir_all(destination).map_err(|source| Error::DirectoryCreationFailed {
        path: destination.to_path_buf(),
        source,
    })?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| Error::Corrupted(e.to_string()))?;
        let name = entry.name().to_string();

        if options.is_excluded(&name) || ((options.files_only || options.flatten) && entry.is_dir()) {
            report.skipped += 1;
            continue;
        }

        let sanitized = match sanitize_path(&name, destination, options) {
            Ok(sanitized) => sanitized,
            Err(Error::ZipSlip { entry: rejected, .. }) if options.on_escape == EscapePolicy::Skip => {
                report.rejected.push(rejected);
                continue;
            }
            Err(e) => return Err(e),
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&sanitized.resolved).map_err(|source| Error::DirectoryCreationFailed {
                path: sanitized.resolved.clone(),
                source,
            })?;
            continue;
        }

        if let Some(parent) = sanitized.resolved.parent() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out = File::create(&sanitized.resolved).map_err(|source| Error::ExtractionFailed {
            path: sanitized.resolved.clone(),
            source,
        })?;
        let size = std::io::copy(&mut entry, &mut out).map_err(|source| Error::ExtractionFailed {
            path: sanitized.resolved.clone(),
            source,
        })?;

        report.entry_count += 1;
        report.total_bytes += size;
        report.entries.push(ExtractedEntry {
            original_path: sanitized.original,
            target_path: sanitized.resolved,
            size,
        });
    }

    Ok(report)
}
