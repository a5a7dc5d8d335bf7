//! Folder and zip archive discovery feeding the ingestion pipeline

use crate::errors::{IngestError, Result};
use crate::ingest::Ingestor;
use crate::stats::OutcomeCounters;
use glob::Pattern;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Inputs discovered under a folder
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub files: Vec<PathBuf>,
    pub archives: Vec<PathBuf>,
}

impl Inputs {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.archives.is_empty()
    }
}

/// Outcome of a folder run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FolderReport {
    pub total_files: usize,
    pub processed: usize,
}

fn matches_base_name(pattern: &Pattern, name: &str) -> bool {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name);
    pattern.matches(base)
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Walk `dir` recursively, collecting zip archives and files whose name matches `pattern`
pub fn find_inputs(dir: &Path, pattern: &Pattern) -> Inputs {
    let mut inputs = Inputs::default();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = ?e.path(), error = %e, "Error accessing path");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        if is_zip(&path) {
            inputs.archives.push(path);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| pattern.matches(name))
        {
            inputs.files.push(path);
        }
    }

    inputs
}

/// Ingest every matching file and archive entry under `dir`.
///
/// A failing file or entry is logged and skipped; each input gets its own
/// counters and its summary is logged once it finishes.
pub async fn ingest_folder(ingestor: &Ingestor, dir: &Path) -> Result<FolderReport> {
    let pattern = Pattern::new(&ingestor.config().file_pattern)
        .map_err(|e| IngestError::Config(format!("invalid file pattern: {}", e)))?;

    let walk_dir = dir.to_path_buf();
    let walk_pattern = pattern.clone();
    let inputs = tokio::task::spawn_blocking(move || find_inputs(&walk_dir, &walk_pattern))
        .await
        .map_err(|e| IngestError::Other(format!("folder walk failed: {}", e)))?;

    let mut report = FolderReport::default();

    if inputs.is_empty() {
        warn!(folder = %dir.display(), pattern = %pattern, "No files found matching pattern");
        return Ok(report);
    }

    report.total_files = inputs.files.len();

    if !inputs.files.is_empty() {
        info!(
            folder = %dir.display(),
            pattern = %pattern,
            file_count = inputs.files.len(),
            "Processing folder"
        );
    }

    for (index, file) in inputs.files.iter().enumerate() {
        info!(index = index + 1, total = inputs.files.len(), file = %file.display(), "Processing file");
        let counters = Arc::new(OutcomeCounters::new());
        match ingestor.ingest_file(file, &counters).await {
            Ok(_) => report.processed += 1,
            Err(e) => error!(file = %file.display(), error = %e, "Error processing file"),
        }
        counters.summarize().log();
    }

    if !inputs.archives.is_empty() {
        info!(zip_count = inputs.archives.len(), "Found zip files");
    }

    for archive in &inputs.archives {
        match ingest_archive(ingestor, archive, &pattern).await {
            Ok(processed) => {
                report.total_files += processed;
                report.processed += processed;
            }
            Err(e) => error!(file = %archive.display(), error = %e, "Error processing zip file"),
        }
    }

    info!(
        total_files = report.total_files,
        processed = report.processed,
        "Folder processing complete"
    );
    Ok(report)
}

/// Ingest each entry of `zip_path` whose base name matches `pattern`.
///
/// Returns how many entries were ingested successfully.
pub async fn ingest_archive(ingestor: &Ingestor, zip_path: &Path, pattern: &Pattern) -> Result<usize> {
    info!(file = %zip_path.display(), "Processing zip file");

    let entries = {
        let zip_path = zip_path.to_path_buf();
        let pattern = pattern.clone();
        tokio::task::spawn_blocking(move || list_matching_entries(&zip_path, &pattern))
            .await
            .map_err(|e| IngestError::Other(format!("zip listing failed: {}", e)))??
    };

    if entries.is_empty() {
        info!(zip = %zip_path.display(), pattern = %pattern, "No matching files in zip");
        return Ok(0);
    }

    info!(zip = %zip_path.display(), count = entries.len(), "Found matching files in zip");

    let mut processed = 0;
    for (position, (index, name)) in entries.iter().enumerate() {
        info!(
            index = position + 1,
            total = entries.len(),
            file = %name,
            zip = %zip_path.display(),
            "Processing file from zip"
        );

        match ingest_entry(ingestor, zip_path, *index, name).await {
            Ok(()) => processed += 1,
            Err(e) => error!(
                file = %name,
                zip = %zip_path.display(),
                error = %e,
                "Error processing file from zip"
            ),
        }
    }

    Ok(processed)
}

/// Indices and names of non-directory entries whose base name matches
fn list_matching_entries(zip_path: &Path, pattern: &Pattern) -> Result<Vec<(usize, String)>> {
    let archive = open_archive(zip_path)?;

    Ok(archive
        .file_names()
        .filter(|name| !name.ends_with('/') && matches_base_name(pattern, name))
        .filter_map(|name| archive.index_for_name(name).map(|index| (index, name.to_string())))
        .collect())
}

fn open_archive(zip_path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(zip_path)?;
    ZipArchive::new(file).map_err(|source| IngestError::Archive {
        path: zip_path.to_path_buf(),
        source,
    })
}

/// Copy one archive entry to a temporary file
fn extract_entry(zip_path: &Path, index: usize) -> Result<NamedTempFile> {
    let mut archive = open_archive(zip_path)?;
    let mut entry = archive.by_index(index).map_err(|source| IngestError::Archive {
        path: zip_path.to_path_buf(),
        source,
    })?;

    let mut tmp = tempfile::Builder::new()
        .prefix("zip-extract-")
        .suffix(".tmp")
        .tempfile()?;
    std::io::copy(&mut entry, &mut tmp)?;
    Ok(tmp)
}

async fn ingest_entry(ingestor: &Ingestor, zip_path: &Path, index: usize, name: &str) -> Result<()> {
    let tmp = {
        let zip_path = zip_path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_entry(&zip_path, index))
            .await
            .map_err(|e| IngestError::Other(format!("zip extraction failed: {}", e)))??
    };
    info!(name = %tmp.path().display(), "unzipped file");

    let counters = Arc::new(OutcomeCounters::new());
    let result = ingestor.ingest_file_as(tmp.path(), name, &counters).await;
    counters.summarize().log();

    // Temporary file is removed when `tmp` drops
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_find_inputs_filters_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.json"), "").unwrap();
        std::fs::write(dir.path().join("nested/b.json"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("bundle.ZIP"), "").unwrap();

        let inputs = find_inputs(dir.path(), &Pattern::new("*.json").unwrap());

        assert_eq!(
            inputs.files,
            vec![dir.path().join("a.json"), dir.path().join("nested/b.json")]
        );
        assert_eq!(inputs.archives, vec![dir.path().join("bundle.ZIP")]);
    }

    #[test]
    fn test_list_matching_entries_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("telemetry.zip");
        write_zip(
            &zip_path,
            &[
                ("logs/", ""),
                ("logs/day1.json", "{}"),
                ("readme.md", "hi"),
                ("day2.json", "{}"),
            ],
        );

        let entries = list_matching_entries(&zip_path, &Pattern::new("*.json").unwrap()).unwrap();
        let names: Vec<&str> = entries.iter().map(|(_, name)| name.as_str()).collect();
        assert_eq!(names, vec!["logs/day1.json", "day2.json"]);
    }

    #[test]
    fn test_extract_entry_contents() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("telemetry.zip");
        write_zip(&zip_path, &[("a.json", "{\"resourceLogs\":[]}\n")]);

        let tmp = extract_entry(&zip_path, 0).unwrap();
        let contents = std::fs::read_to_string(tmp.path()).unwrap();
        assert_eq!(contents, "{\"resourceLogs\":[]}\n");
    }

    #[test]
    fn test_corrupt_archive_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("broken.zip");
        std::fs::write(&zip_path, "not a zip").unwrap();

        let result = list_matching_entries(&zip_path, &Pattern::new("*").unwrap());
        assert!(matches!(result, Err(IngestError::Archive { .. })));
    }
}
