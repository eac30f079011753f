//! # Video Module
//!
//! Near-duplicate video detection from sampled frames.
//!
//! ## Fingerprint
//! `n` frames are sampled at evenly spaced indices (`step = total / (n + 1)`)
//! and each decoded frame is reduced to a 64-bit pHash. The fingerprint is the
//! ordered list of those hashes.
//!
//! ## Similarity
//! Fingerprints are aligned by position. A position matches when its hashes
//! differ by at most [`FRAME_MATCH_DISTANCE`] bits; the score is the share of
//! matching positions.
//!
//! Frame decoding is pluggable through [`VideoDecoder`]. The default decoder
//! shells out to ffmpeg, and the engine reports itself unavailable when ffmpeg
//! cannot be found.

mod ffmpeg;

pub use ffmpeg::FfmpegDecoder;

use crate::core::comparator::{group_by_similarity, Measurement, SimilarityGroup, Threshold};
use crate::core::context::{extract_parallel, ScanContext};
use crate::core::hasher::{PerceptualHash, PerceptualHasher};
use crate::core::scanner::{regular_files, MediaFilter, WalkDirScanner};
use crate::error::{CapabilityError, EngineError, VideoError};
use crate::events::{AnalysisKind, CompareEvent, Event};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Frames sampled per video
pub const DEFAULT_SAMPLE_FRAMES: usize = 10;

/// Default matched-frame percentage for video scans
pub const DEFAULT_SIMILARITY_PERCENT: f64 = 60.0;

/// Max Hamming distance for two frames to count as the same shot
pub const FRAME_MATCH_DISTANCE: u32 = 10;

/// Opens video containers
pub trait VideoDecoder: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoStream>, VideoError>;
}

/// An opened video container
pub trait VideoStream {
    /// Total frames as reported by the container; `<= 0` when unknown
    fn frame_count(&self) -> i64;

    /// Decode the frame at `index` as RGB, `None` on failure
    fn read_frame(&mut self, index: u64) -> Option<DynamicImage>;
}

/// Ordered frame hashes of one video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFingerprint {
    frames: Vec<PerceptualHash>,
}

impl VideoFingerprint {
    pub fn frames(&self) -> &[PerceptualHash] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn similarity(&self, other: &VideoFingerprint) -> f64 {
        similarity(self, other)
    }
}

/// Percentage of aligned frame pairs within [`FRAME_MATCH_DISTANCE`].
///
/// Only the first `min(len_a, len_b)` positions are compared. Empty
/// fingerprints score 0.
pub fn similarity(a: &VideoFingerprint, b: &VideoFingerprint) -> f64 {
    let compared = a.len().min(b.len());
    if compared == 0 {
        return 0.0;
    }

    let matches = a
        .frames
        .iter()
        .zip(&b.frames)
        .filter(|(x, y)| x.distance(y) <= FRAME_MATCH_DISTANCE)
        .count();

    matches as f64 / compared as f64 * 100.0
}

/// Video fingerprinting and grouping
pub struct VideoFingerprintEngine {
    decoder: Option<Arc<dyn VideoDecoder>>,
    hasher: PerceptualHasher,
    scanner: WalkDirScanner,
}

impl VideoFingerprintEngine {
    /// Probe for ffmpeg once; the engine is inactive if it is missing.
    pub fn new() -> Self {
        let decoder = FfmpegDecoder::probe()
            .ok()
            .map(|decoder| Arc::new(decoder) as Arc<dyn VideoDecoder>);
        Self::from_parts(decoder)
    }

    /// An engine without a decoder; every scan reports `Unavailable`
    pub fn unavailable() -> Self {
        Self::from_parts(None)
    }

    pub fn with_decoder(decoder: impl VideoDecoder + 'static) -> Self {
        Self::from_parts(Some(Arc::new(decoder)))
    }

    pub fn with_shared_decoder(decoder: Arc<dyn VideoDecoder>) -> Self {
        Self::from_parts(Some(decoder))
    }

    pub fn with_scanner(mut self, scanner: WalkDirScanner) -> Self {
        self.scanner = scanner;
        self
    }

    fn from_parts(decoder: Option<Arc<dyn VideoDecoder>>) -> Self {
        Self {
            decoder,
            hasher: PerceptualHasher::new(),
            scanner: WalkDirScanner::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.decoder.is_some()
    }

    fn decoder(&self) -> Result<&dyn VideoDecoder, CapabilityError> {
        self.decoder
            .as_deref()
            .ok_or(CapabilityError::Unavailable {
                capability: "video decoder",
            })
    }

    /// Sample `frames` frames from `path`.
    ///
    /// `None` if the video cannot be opened, reports no frames, or fewer than
    /// `frames / 2` samples decode.
    pub fn fingerprint(&self, path: &Path, frames: usize) -> Option<VideoFingerprint> {
        let decoder = self.decoder().ok()?;
        match self.try_fingerprint(decoder, path, frames) {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                tracing::warn!("Skipping video: {}", e);
                None
            }
        }
    }

    fn try_fingerprint(
        &self,
        decoder: &dyn VideoDecoder,
        path: &Path,
        frames: usize,
    ) -> Result<VideoFingerprint, VideoError> {
        let mut stream = decoder.open(path)?;

        let total = stream.frame_count();
        if total <= 0 {
            return Err(VideoError::NoFrames {
                path: path.to_path_buf(),
            });
        }

        // Very short clips give step 0 and sample the first frame repeatedly.
        let step = total as u64 / (frames as u64 + 1);
        let mut hashes = Vec::with_capacity(frames);

        for k in 1..=frames as u64 {
            let index = step * k;
            let Some(frame) = stream.read_frame(index) else {
                tracing::debug!("Frame {} of {} did not decode", index, path.display());
                continue;
            };

            match self.hasher.hash_image(&frame) {
                Ok(hash) => hashes.push(hash),
                Err(e) => tracing::debug!("Frame {} of {}: {}", index, path.display(), e),
            }
        }

        let required = frames / 2;
        if hashes.len() < required {
            return Err(VideoError::TooFewFrames {
                path: path.to_path_buf(),
                decoded: hashes.len(),
                required,
            });
        }

        Ok(VideoFingerprint { frames: hashes })
    }

    /// Group the videos (mp4, avi, mkv, mov, wmv, flv, webm, m4v) under `root`.
    pub fn scan_folder(&self, root: &Path, min_percent: f64) -> Result<Vec<SimilarityGroup>, EngineError> {
        self.scan_folder_with(root, min_percent, &ScanContext::silent())
    }

    pub fn scan_folder_with(
        &self,
        root: &Path,
        min_percent: f64,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, EngineError> {
        let decoder = self.decoder()?;
        let walked = self.scanner.scan(root, &MediaFilter::videos(), ctx)?;
        self.group_paths(decoder, &walked.paths(), min_percent, ctx)
    }

    /// Group an explicit list of files, whatever their extension.
    pub fn scan_file_list(&self, paths: &[PathBuf], min_percent: f64) -> Result<Vec<SimilarityGroup>, EngineError> {
        self.scan_file_list_with(paths, min_percent, &ScanContext::silent())
    }

    pub fn scan_file_list_with(
        &self,
        paths: &[PathBuf],
        min_percent: f64,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, EngineError> {
        let decoder = self.decoder()?;
        self.group_paths(decoder, &regular_files(paths), min_percent, ctx)
    }

    fn group_paths(
        &self,
        decoder: &dyn VideoDecoder,
        paths: &[PathBuf],
        min_percent: f64,
        ctx: &ScanContext,
    ) -> Result<Vec<SimilarityGroup>, EngineError> {
        let fingerprints = extract_parallel(paths, AnalysisKind::Video, ctx, |path| {
            self.try_fingerprint(decoder, path, DEFAULT_SAMPLE_FRAMES)
        })?;

        ctx.events.send(Event::Compare(CompareEvent::Started {
            kind: AnalysisKind::Video,
            items: fingerprints.items.len(),
        }));

        let groups = group_by_similarity(
            &fingerprints.items,
            Threshold::percent(min_percent),
            |a: &VideoFingerprint, b: &VideoFingerprint| Measurement::percent(similarity(a, b)),
        );

        ctx.events.send(Event::Compare(CompareEvent::Completed {
            kind: AnalysisKind::Video,
            groups: groups.len(),
        }));

        tracing::info!(
            "Video scan: {} fingerprinted, {} skipped, {} groups",
            fingerprints.items.len(),
            fingerprints.skipped.len(),
            groups.len()
        );

        Ok(groups)
    }
}

impl Default for VideoFingerprintEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use image::{ImageBuffer, Rgb};
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Frames are stripes whose period depends on the clip's "scene" and index.
    fn frame(scene: u32, index: u64) -> DynamicImage {
        let period = 4 + scene * 7 + (index as u32 % 3);
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(64, 64, |x, y| {
            if ((x + y * scene) / period) % 2 == 0 {
                Rgb([230, 230, 230])
            } else {
                Rgb([25, 25, 25])
            }
        }))
    }

    #[derive(Clone)]
    struct Clip {
        scene: u32,
        frames: i64,
        /// Indices that fail to decode
        broken: Vec<u64>,
    }

    #[derive(Default)]
    struct MockDecoder {
        clips: HashMap<String, Clip>,
    }

    impl MockDecoder {
        fn clip(mut self, name: &str, scene: u32, frames: i64) -> Self {
            self.clips.insert(
                name.to_string(),
                Clip {
                    scene,
                    frames,
                    broken: Vec::new(),
                },
            );
            self
        }

        fn broken_clip(mut self, name: &str, frames: i64, broken: Vec<u64>) -> Self {
            self.clips.insert(
                name.to_string(),
                Clip {
                    scene: 1,
                    frames,
                    broken,
                },
            );
            self
        }
    }

    struct MockStream(Clip);

    impl VideoStream for MockStream {
        fn frame_count(&self) -> i64 {
            self.0.frames
        }

        fn read_frame(&mut self, index: u64) -> Option<DynamicImage> {
            if self.0.broken.contains(&index) {
                None
            } else {
                Some(frame(self.0.scene, index))
            }
        }
    }

    impl VideoDecoder for MockDecoder {
        fn open(&self, path: &Path) -> Result<Box<dyn VideoStream>, VideoError> {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match self.clips.get(&name) {
                Some(clip) => Ok(Box::new(MockStream(clip.clone()))),
                None => Err(VideoError::OpenFailed {
                    path: path.to_path_buf(),
                    reason: "unknown clip".to_string(),
                }),
            }
        }
    }

    fn fingerprint_of(values: &[u64]) -> VideoFingerprint {
        VideoFingerprint {
            frames: values.iter().map(|&v| PerceptualHash(v)).collect(),
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"not really a video").unwrap();
        path
    }

    #[test]
    fn similarity_counts_matching_positions() {
        let a = fingerprint_of(&[0, 0, 0, 0]);
        let b = fingerprint_of(&[0, 0b111, u64::MAX, u64::MAX]);

        assert_eq!(similarity(&a, &b), 50.0);
        assert_eq!(similarity(&b, &a), 50.0);
    }

    #[test]
    fn similarity_uses_shorter_length() {
        let a = fingerprint_of(&[1, 2, 3, 4, 5, 6]);
        let b = fingerprint_of(&[1, 2, 3]);

        assert_eq!(similarity(&a, &b), 100.0);
    }

    #[test]
    fn similarity_of_empty_fingerprint_is_zero() {
        let empty = fingerprint_of(&[]);
        let full = fingerprint_of(&[1, 2]);

        assert_eq!(similarity(&empty, &full), 0.0);
        assert_eq!(similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn fingerprint_samples_requested_frames() {
        let engine = VideoFingerprintEngine::with_decoder(MockDecoder::default().clip("a.mp4", 1, 110));

        let fingerprint = engine.fingerprint(Path::new("a.mp4"), 10).unwrap();

        assert_eq!(fingerprint.len(), 10);
    }

    #[test]
    fn short_video_with_too_few_decodable_frames_is_rejected() {
        // 100 frames, step 9: samples 9, 18, ..., 90. Only four survive.
        let broken = vec![45, 54, 63, 72, 81, 90];
        let engine =
            VideoFingerprintEngine::with_decoder(MockDecoder::default().broken_clip("short.mp4", 100, broken));

        assert!(engine.fingerprint(Path::new("short.mp4"), 10).is_none());
    }

    #[test]
    fn half_the_frames_is_enough() {
        let broken = vec![54, 63, 72, 81, 90];
        let engine =
            VideoFingerprintEngine::with_decoder(MockDecoder::default().broken_clip("half.mp4", 100, broken));

        let fingerprint = engine.fingerprint(Path::new("half.mp4"), 10).unwrap();
        assert_eq!(fingerprint.len(), 5);
    }

    #[test]
    fn zero_frame_video_is_rejected() {
        let engine = VideoFingerprintEngine::with_decoder(MockDecoder::default().clip("empty.mp4", 1, 0));
        assert!(engine.fingerprint(Path::new("empty.mp4"), 10).is_none());
    }

    #[test]
    fn tiny_video_samples_first_frame_repeatedly() {
        let engine = VideoFingerprintEngine::with_decoder(MockDecoder::default().clip("tiny.mp4", 2, 5));

        let fingerprint = engine.fingerprint(Path::new("tiny.mp4"), 10).unwrap();

        assert_eq!(fingerprint.len(), 10);
        assert!(fingerprint.frames().windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn unopenable_video_is_rejected() {
        let engine = VideoFingerprintEngine::with_decoder(MockDecoder::default());
        assert!(engine.fingerprint(Path::new("missing.mp4"), 10).is_none());
    }

    #[test]
    fn file_list_scan_groups_same_scene() {
        let temp_dir = TempDir::new().unwrap();
        let a = touch(temp_dir.path(), "a.mp4");
        let b = touch(temp_dir.path(), "b.mkv");
        let c = touch(temp_dir.path(), "c.mov");
        let decoder = MockDecoder::default()
            .clip("a.mp4", 1, 220)
            .clip("b.mkv", 1, 220)
            .clip("c.mov", 3, 220);

        let engine = VideoFingerprintEngine::with_decoder(decoder);
        let groups = engine.scan_file_list(&[a.clone(), b.clone(), c], 60.0).unwrap();

        assert_eq!(groups.len(), 1);
        let paths: Vec<_> = groups[0].paths().map(Path::to_path_buf).collect();
        assert_eq!(paths, vec![a, b]);
        assert_eq!(groups[0].members[1].score, 100.0);
    }

    #[test]
    fn folder_scan_only_reads_video_extensions() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a.mp4");
        touch(temp_dir.path(), "b.webm");
        touch(temp_dir.path(), "b.txt");
        let decoder = MockDecoder::default()
            .clip("a.mp4", 1, 220)
            .clip("b.webm", 1, 220)
            .clip("b.txt", 1, 220);

        let groups = VideoFingerprintEngine::with_decoder(decoder)
            .scan_folder(temp_dir.path(), 60.0)
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn scan_without_decoder_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let engine = VideoFingerprintEngine::unavailable();

        assert!(!engine.is_available());
        assert!(engine.fingerprint(Path::new("a.mp4"), 10).is_none());
        assert!(matches!(
            engine.scan_folder(temp_dir.path(), 60.0),
            Err(EngineError::Capability(CapabilityError::Unavailable { .. }))
        ));
    }

    #[test]
    fn folder_scan_missing_root_is_error() {
        let engine = VideoFingerprintEngine::with_decoder(MockDecoder::default());
        assert!(matches!(
            engine.scan_folder(Path::new("/nonexistent/videos"), 60.0),
            Err(EngineError::Scan(ScanError::DirectoryNotFound { .. }))
        ));
    }
}
