//! Exact-duplicate scan and its statistics.

use super::{hash_file, DualDigest};
use crate::core::context::{extract_parallel, ScanContext, SkippedFile};
use crate::core::scanner::{FileCategory, FileEntry, MediaFilter, ScanConfig, WalkDirScanner};
use crate::error::ScanError;
use crate::events::AnalysisKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Files sharing one digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateSet {
    pub digest: DualDigest,
    /// Always two or more paths, in walk order
    pub paths: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Copies beyond the first
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }
}

/// Result of [`find_exact_duplicates`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExactDuplicateReport {
    /// Sets in the order their first member was walked
    pub sets: Vec<DuplicateSet>,
    /// Regular files seen under the root
    pub files_scanned: usize,
    /// Sum of their sizes
    pub bytes_scanned: u64,
    /// Files whose size or content could not be read
    pub skipped: Vec<SkippedFile>,
}

/// Walk `root` and group every regular file by content digest.
pub fn find_exact_duplicates(root: &Path) -> Result<ExactDuplicateReport, ScanError> {
    find_exact_duplicates_with(root, &ScanConfig::default(), &ScanContext::silent())
}

/// [`find_exact_duplicates`] with progress events and cancellation.
pub fn find_exact_duplicates_with(
    root: &Path,
    config: &ScanConfig,
    ctx: &ScanContext,
) -> Result<ExactDuplicateReport, ScanError> {
    let scanner = WalkDirScanner::new(config.clone());
    let walked = scanner.scan(root, &MediaFilter::any(), ctx)?;

    let mut skipped: Vec<SkippedFile> = walked
        .errors
        .iter()
        .map(|e| SkippedFile {
            path: scan_error_path(e),
            reason: e.to_string(),
        })
        .collect();

    let files_scanned = walked.files.len();
    let bytes_scanned = walked.files.iter().map(|f| f.size).sum();
    let paths = walked.paths();

    let extracted = extract_parallel(&paths, AnalysisKind::Digest, ctx, hash_file)?;
    skipped.extend(extracted.skipped);

    let mut index: HashMap<DualDigest, usize> = HashMap::new();
    let mut buckets: Vec<DuplicateSet> = Vec::new();

    for (path, digest) in extracted.items {
        match index.get(&digest) {
            Some(&slot) => buckets[slot].paths.push(path),
            None => {
                index.insert(digest, buckets.len());
                buckets.push(DuplicateSet {
                    digest,
                    paths: vec![path],
                });
            }
        }
    }

    let sets: Vec<DuplicateSet> = buckets.into_iter().filter(|s| s.paths.len() > 1).collect();

    tracing::info!(
        "Exact scan of {}: {} files, {} duplicate sets, {} skipped",
        root.display(),
        files_scanned,
        sets.len(),
        skipped.len()
    );

    Ok(ExactDuplicateReport {
        sets,
        files_scanned,
        bytes_scanned,
        skipped,
    })
}

fn scan_error_path(error: &ScanError) -> PathBuf {
    match error {
        ScanError::DirectoryNotFound { path }
        | ScanError::PermissionDenied { path }
        | ScanError::ReadDirectory { path, .. }
        | ScanError::NotFound { path } => path.clone(),
        ScanError::Cancelled => PathBuf::new(),
    }
}

/// Storage summary derived from an [`ExactDuplicateReport`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateStatistics {
    pub total_files: usize,
    pub total_size: u64,
    /// Copies beyond the first, summed over all sets
    pub total_duplicates: usize,
    /// Bytes freed by keeping one copy of every set
    pub reclaimable_bytes: u64,
    /// Reclaimable bytes keyed by the category of each set's first file
    pub space_by_category: BTreeMap<FileCategory, u64>,
}

impl DuplicateStatistics {
    /// Sets whose first file has vanished since the scan are left out.
    pub fn from_report(report: &ExactDuplicateReport) -> Self {
        let mut stats = Self {
            total_files: report.files_scanned,
            total_size: report.bytes_scanned,
            ..Default::default()
        };

        for set in &report.sets {
            let Some(first) = set.paths.first() else {
                continue;
            };

            let entry = match FileEntry::from_path(first) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Leaving set out of statistics: {}", e);
                    continue;
                }
            };

            let copies = set.duplicate_count();
            let wasted = entry.size * copies as u64;

            stats.total_duplicates += copies;
            stats.reclaimable_bytes += wasted;
            *stats.space_by_category.entry(entry.category).or_insert(0) += wasted;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn groups_identical_files_only() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "a.jpg", b"photo-bytes");
        write(temp_dir.path(), "b.jpg", b"photo-bytes");
        write(temp_dir.path(), "c.jpg", b"other-bytes");

        let report = find_exact_duplicates(temp_dir.path()).unwrap();

        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.bytes_scanned, 33);
        assert_eq!(report.sets.len(), 1);
        let names: Vec<_> = report.sets[0]
            .paths
            .iter()
            .map(|p| p.file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn no_set_has_a_single_member() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "one.txt", b"1");
        write(temp_dir.path(), "two.txt", b"2");
        write(temp_dir.path(), "nested/three.txt", b"3");

        let report = find_exact_duplicates(temp_dir.path()).unwrap();

        assert!(report.sets.is_empty());
        assert_eq!(report.files_scanned, 3);
    }

    #[test]
    fn duplicates_found_across_directories_and_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "x/.copy.bin", b"payload");
        write(temp_dir.path(), "y/original.bin", b"payload");

        let report = find_exact_duplicates(temp_dir.path()).unwrap();

        assert_eq!(report.sets.len(), 1);
        assert_eq!(report.sets[0].paths.len(), 2);
    }

    #[test]
    fn missing_root_is_hard_error() {
        let result = find_exact_duplicates(Path::new("/nonexistent/root/777"));
        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }

    #[test]
    fn statistics_sum_reclaimable_space() {
        let temp_dir = TempDir::new().unwrap();
        let photo = vec![7u8; 100];
        write(temp_dir.path(), "a.png", &photo);
        write(temp_dir.path(), "b.png", &photo);
        write(temp_dir.path(), "c.png", &photo);
        write(temp_dir.path(), "n1.txt", b"notes");
        write(temp_dir.path(), "n2.txt", b"notes");

        let report = find_exact_duplicates(temp_dir.path()).unwrap();
        let stats = DuplicateStatistics::from_report(&report);

        assert_eq!(stats.total_files, 5);
        assert_eq!(stats.total_size, 310);
        assert_eq!(stats.total_duplicates, 3);
        assert_eq!(stats.reclaimable_bytes, 205);
        assert_eq!(stats.space_by_category[&FileCategory::Images], 200);
        assert_eq!(stats.space_by_category[&FileCategory::Documents], 5);
    }

    #[test]
    fn statistics_skip_sets_whose_first_file_vanished() {
        let temp_dir = TempDir::new().unwrap();
        let first = write(temp_dir.path(), "a.bin", b"data");
        write(temp_dir.path(), "b.bin", b"data");

        let report = find_exact_duplicates(temp_dir.path()).unwrap();
        fs::remove_file(first).unwrap();
        let stats = DuplicateStatistics::from_report(&report);

        assert_eq!(stats.total_duplicates, 0);
        assert_eq!(stats.reclaimable_bytes, 0);
    }
}
