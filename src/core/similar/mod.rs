//! # Similar Images Module
//!
//! Perceptual image similarity: one-to-one comparison and grouped scans.
//!
//! ## Comparison
//! Two images are compared on two axes:
//! - **pHash similarity** - `(64 - hamming) / 64 * 100`, robust to re-encoding and resizing
//! - **SSIM** - structural similarity of the grayscale pixels, after resizing the
//!   first image to the second's dimensions
//!
//! ## Scans
//! Folder and list scans hash every image once and group the hashes with the
//! shared greedy grouper under a Hamming-distance threshold.

mod ssim;

pub use ssim::{ssim, WINDOW as SSIM_WINDOW};

use crate::core::comparator::{
    group_by_similarity, Measurement, SimilarityGroup, Threshold,
};
use crate::core::context::{extract_parallel, ScanContext};
use crate::core::hasher::{
    luma_bt601, mmap_decode::read_file_bytes, FastDecoder, FastResizer, PerceptualHash,
    PerceptualHasher,
};
use crate::core::scanner::{regular_files, MediaFilter, WalkDirScanner};
use crate::error::{HashError, ScanError};
use crate::events::{AnalysisKind, CompareEvent, Event};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Hamming-distance cutoff for image scans
pub const DEFAULT_HAMMING_THRESHOLD: u32 = 10;

/// Result of comparing two images
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairwiseSimilarity {
    /// Structural similarity, 0-100
    pub ssim_percent: f64,
    /// Perceptual hash similarity, 0-100
    pub phash_percent: f64,
    /// Differing hash bits, 0-64
    pub hamming_distance: u32,
}

/// Outcome of [`ImageSimilarityEngine::compare_files`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairVerdict {
    pub first: PathBuf,
    pub second: PathBuf,
    pub similarity: PairwiseSimilarity,
    /// Percentage the pHash similarity had to reach
    pub threshold_percent: f64,
    pub is_similar: bool,
}

/// Image comparison and grouping
#[derive(Default)]
pub struct ImageSimilarityEngine {
    hasher: PerceptualHasher,
    scanner: WalkDirScanner,
}

impl ImageSimilarityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom walker configuration for folder scans
    pub fn with_scanner(mut self, scanner: WalkDirScanner) -> Self {
        self.scanner = scanner;
        self
    }

    /// Compare two encoded images.
    ///
    /// Returns `None` (and logs why) if either side fails to decode or is
    /// smaller than the SSIM window.
    pub fn pairwise_image_similarity(&self, bytes_a: &[u8], bytes_b: &[u8]) -> Option<PairwiseSimilarity> {
        self.compare_bytes(bytes_a, Path::new("<first image>"), bytes_b, Path::new("<second image>"))
    }

    /// Read two files and compare them, judging similarity on pHash.
    pub fn compare_files(&self, path_a: &Path, path_b: &Path, threshold_percent: f64) -> Option<PairVerdict> {
        let read = |path: &Path| {
            read_file_bytes(path)
                .map_err(|e| tracing::warn!("Cannot compare {}: {}", path.display(), e))
                .ok()
        };

        let bytes_a = read(path_a)?;
        let bytes_b = read(path_b)?;
        let similarity = self.compare_bytes(&bytes_a, path_a, &bytes_b, path_b)?;

        Some(PairVerdict {
            first: path_a.to_path_buf(),
            second: path_b.to_path_buf(),
            similarity,
            threshold_percent,
            is_similar: similarity.phash_percent >= threshold_percent,
        })
    }

    fn compare_bytes(
        &self,
        bytes_a: &[u8],
        label_a: &Path,
        bytes_b: &[u8],
        label_b: &Path,
    ) -> Option<PairwiseSimilarity> {
        match self.try_compare(bytes_a, label_a, bytes_b, label_b) {
            Ok(similarity) => Some(similarity),
            Err(e) => {
                tracing::warn!("Similarity error: {}", e);
                None
            }
        }
    }

    fn try_compare(
        &self,
        bytes_a: &[u8],
        label_a: &Path,
        bytes_b: &[u8],
        label_b: &Path,
    ) -> Result<PairwiseSimilarity, HashError> {
        let image_a = FastDecoder::decode_bytes(bytes_a, label_a)?;
        let image_b = FastDecoder::decode_bytes(bytes_b, label_b)?;

        let hash_a = self.hasher.hash_image(&image_a)?;
        let hash_b = self.hasher.hash_image(&image_b)?;
        let hamming_distance = hash_a.distance(&hash_b);

        let gray_b = luma_bt601(&image_b);
        let gray_a = FastResizer::new().resize_gray(&luma_bt601(&image_a), gray_b.width(), gray_b.height())?;

        let structural = ssim(&gray_a, &gray_b)?;

        Ok(PairwiseSimilarity {
            ssim_percent: structural * 100.0,
            phash_percent: hash_a.similarity_percent(&hash_b),
            hamming_distance,
        })
    }

    /// Group the images (png, jpg, jpeg, bmp, gif) under `root`.
    pub fn scan_folder(&self, root: &Path, hamming_threshold: u32) -> Result<Vec<SimilarityGroup>, ScanError> {
        self.scan_folder_with(root, hamming_threshold, &ScanContext::silent())
    }

    pub fn scan_folder_with(
        &self,
        root: &Path,
        hamming_threshold: u32,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, ScanError> {
        let walked = self.scanner.scan(root, &MediaFilter::images(), ctx)?;
        self.group_paths(&walked.paths(), hamming_threshold, ctx)
    }

    /// Group an explicit list. Anything that is not a regular file is skipped;
    /// extensions are not checked.
    pub fn scan_file_list(&self, paths: &[PathBuf], hamming_threshold: u32) -> Result<Vec<SimilarityGroup>, ScanError> {
        self.scan_file_list_with(paths, hamming_threshold, &ScanContext::silent())
    }

    pub fn scan_file_list_with(
        &self,
        paths: &[PathBuf],
        hamming_threshold: u32,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, ScanError> {
        self.group_paths(&regular_files(paths), hamming_threshold, ctx)
    }

    fn group_paths(
        &self,
        paths: &[PathBuf],
        hamming_threshold: u32,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, ScanError> {
        let hashes = extract_parallel(paths, AnalysisKind::Image, ctx, |path| {
            self.hasher.hash_file(path)
        })?;

        ctx.events.send(Event::Compare(CompareEvent::Started {
            kind: AnalysisKind::Image,
            items: hashes.items.len(),
        }));

        let groups = group_by_similarity(
            &hashes.items,
            Threshold::hamming(hamming_threshold),
            |a: &PerceptualHash, b: &PerceptualHash| {
                Measurement::new(a.distance(b) as f64, a.similarity_percent(b))
            },
        );

        ctx.events.send(Event::Compare(CompareEvent::Completed {
            kind: AnalysisKind::Image,
            groups: groups.len(),
        }));

        tracing::info!(
            "Image scan: {} hashed, {} skipped, {} groups",
            hashes.items.len(),
            hashes.skipped.len(),
            groups.len()
        );

        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn stripes(width: u32, height: u32, period: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, _| {
            if (x / period) % 2 == 0 {
                Rgb([240, 240, 240])
            } else {
                Rgb([20, 20, 20])
            }
        }))
    }

    fn diagonal(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            let v = ((x + y) * 255 / (width + height)) as u8;
            Rgb([v, 255 - v, v / 2])
        }))
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    fn save(dir: &Path, name: &str, image: &DynamicImage) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, png_bytes(image)).unwrap();
        path
    }

    #[test]
    fn identical_bytes_are_fully_similar() {
        let engine = ImageSimilarityEngine::new();
        let bytes = png_bytes(&diagonal(64, 48));

        let result = engine.pairwise_image_similarity(&bytes, &bytes).unwrap();

        assert_eq!(result.hamming_distance, 0);
        assert_eq!(result.phash_percent, 100.0);
        assert!((result.ssim_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn different_sizes_are_resized_before_ssim() {
        let engine = ImageSimilarityEngine::new();
        let large = png_bytes(&stripes(128, 64, 16));
        let small = png_bytes(&stripes(64, 32, 8));

        let result = engine.pairwise_image_similarity(&large, &small).unwrap();

        assert!(result.hamming_distance <= 10);
        assert!(result.ssim_percent > 50.0, "ssim {}", result.ssim_percent);
    }

    #[test]
    fn undecodable_input_returns_none() {
        let engine = ImageSimilarityEngine::new();
        let good = png_bytes(&diagonal(32, 32));

        assert!(engine.pairwise_image_similarity(b"garbage", &good).is_none());
    }

    #[test]
    fn tiny_images_return_none() {
        let engine = ImageSimilarityEngine::new();
        let tiny = png_bytes(&diagonal(5, 5));

        assert!(engine.pairwise_image_similarity(&tiny, &tiny).is_none());
    }

    #[test]
    fn compare_files_applies_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let a = save(temp_dir.path(), "a.png", &diagonal(64, 64));
        let b = save(temp_dir.path(), "b.png", &diagonal(64, 64));

        let verdict = ImageSimilarityEngine::new().compare_files(&a, &b, 95.0).unwrap();

        assert!(verdict.is_similar);
        assert_eq!(verdict.threshold_percent, 95.0);
    }

    #[test]
    fn compare_files_missing_file_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let a = save(temp_dir.path(), "a.png", &diagonal(64, 64));

        let verdict =
            ImageSimilarityEngine::new().compare_files(&a, &temp_dir.path().join("nope.png"), 95.0);
        assert!(verdict.is_none());
    }

    #[test]
    fn folder_scan_groups_copies_and_skips_broken_files() {
        let temp_dir = TempDir::new().unwrap();
        save(temp_dir.path(), "a.png", &stripes(96, 96, 12));
        save(temp_dir.path(), "b.png", &stripes(96, 96, 12));
        save(temp_dir.path(), "notes.webp", &stripes(96, 96, 12));
        fs::write(temp_dir.path().join("broken.jpg"), b"\xFF\xD8\xFF garbage").unwrap();

        let groups = ImageSimilarityEngine::new().scan_folder(temp_dir.path(), 10).unwrap();

        assert_eq!(groups.len(), 1);
        let names: Vec<_> = groups[0]
            .paths()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn file_list_scan_ignores_extensions_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let a = save(temp_dir.path(), "first.dat", &stripes(96, 96, 12));
        let b = save(temp_dir.path(), "second.bin", &stripes(96, 96, 12));

        let paths = vec![a, temp_dir.path().to_path_buf(), b];
        let groups = ImageSimilarityEngine::new().scan_file_list(&paths, 10).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn folder_scan_missing_root_is_error() {
        let result = ImageSimilarityEngine::new().scan_folder(Path::new("/nonexistent/pics"), 10);
        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }
}
