//! # Quality Analysis Module
//!
//! Scores how good a photo looks, for picking the best shot of a series.
//!
//! ## Score
//! - **Aesthetic** (65%) - a vision-language model's preference for
//!   "high quality" over "low quality" prompts
//! - **Technical** (35%) - Laplacian variance for sharpness, optionally
//!   blended with a no-reference metric such as BRISQUE
//!
//! Too dark or too bright images (mean below 30 or above 220) have their
//! technical score halved.
//!
//! The model and the metric are supplied by the caller. Without a model the
//! scorer is inactive and folder analysis returns no results.

mod technical;

pub use technical::{laplacian_variance, mean_brightness};

use crate::core::context::{extract_parallel, ScanContext};
use crate::core::hasher::{luma_bt601, FastDecoder, FastResizer};
use crate::core::scanner::{FileCategory, FileEntry, MediaFilter, WalkDirScanner};
use crate::error::{CapabilityError, EngineError, QualityError, ScanError};
use crate::events::AnalysisKind;
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prompts scored by the vision-language model, preferred one first
pub const AESTHETIC_PROMPTS: [&str; 2] = [
    "high quality, professional, aesthetic",
    "low quality, blurry, ugly",
];

const AESTHETIC_WEIGHT: f64 = 0.65;
const TECHNICAL_WEIGHT: f64 = 0.35;
const BRIGHTNESS_LOWER: f64 = 30.0;
const BRIGHTNESS_UPPER: f64 = 220.0;
const BRIGHTNESS_PENALTY: f64 = 0.5;

pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Image-text similarity model (CLIP-style)
pub trait VisionLanguageModel: Send + Sync {
    /// One logit per prompt, higher meaning a better match
    fn logits(&self, image: &DynamicImage, prompts: &[&str]) -> Result<Vec<f64>, CollaboratorError>;
}

/// No-reference quality metric where lower is better, roughly 0-100
pub trait NoReferenceMetric: Send + Sync {
    fn score(&self, gray: &GrayImage) -> Result<f64, CollaboratorError>;
}

/// Blend of the technical sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TechnicalWeights {
    pub laplacian: f64,
    pub brisque: f64,
}

/// Configuration for the hybrid scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Laplacian variance that maps to a full sharpness score
    pub laplacian_max: f64,
    /// Downscale wider images to this width before the technical metrics
    pub working_width: Option<u32>,
    pub weights: TechnicalWeights,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            laplacian_max: 1500.0,
            working_width: None,
            weights: TechnicalWeights {
                laplacian: 1.0,
                brisque: 0.0,
            },
        }
    }
}

impl QualityConfig {
    /// Sharpness blended with a no-reference metric on a 1024px working copy
    pub fn brisque_blend() -> Self {
        Self {
            laplacian_max: 1000.0,
            working_width: Some(1024),
            weights: TechnicalWeights {
                laplacian: 0.6,
                brisque: 0.4,
            },
        }
    }
}

/// Unnormalized measurements, one decimal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    pub laplacian: f64,
    /// 0 when no metric is loaded
    pub brisque: f64,
    pub brightness: f64,
}

/// Quality of one image; scores are 0-100 with two decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub final_score: f64,
    pub aesthetic: f64,
    pub technical: f64,
    pub raw_metrics: RawMetrics,
    pub penalty_applied: bool,
}

/// A scored image found by [`HybridQualityScorer::analyze_folder`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub path: PathBuf,
    pub category: FileCategory,
    pub size: u64,
    pub score: QualityScore,
}

/// Outcome of a folder analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScan {
    /// `false` when no aesthetic model is loaded
    pub active: bool,
    /// Best first
    pub results: Vec<QualityReport>,
}

/// Pixel measurements before scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechnicalMetrics {
    pub laplacian: f64,
    pub brightness: f64,
    pub brisque: Option<f64>,
}

/// Aesthetic + technical image scorer
pub struct HybridQualityScorer {
    config: QualityConfig,
    model: Option<Arc<dyn VisionLanguageModel>>,
    metric: Option<Arc<dyn NoReferenceMetric>>,
    scanner: WalkDirScanner,
}

impl HybridQualityScorer {
    pub fn new(config: QualityConfig) -> Self {
        Self {
            config,
            model: None,
            metric: None,
            scanner: WalkDirScanner::default(),
        }
    }

    pub fn with_model(mut self, model: impl VisionLanguageModel + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    pub fn with_metric(mut self, metric: impl NoReferenceMetric + 'static) -> Self {
        self.metric = Some(Arc::new(metric));
        self
    }

    pub fn with_shared_model(mut self, model: Option<Arc<dyn VisionLanguageModel>>) -> Self {
        self.model = model;
        self
    }

    pub fn with_shared_metric(mut self, metric: Option<Arc<dyn NoReferenceMetric>>) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_scanner(mut self, scanner: WalkDirScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Whether an aesthetic model is loaded
    pub fn is_active(&self) -> bool {
        self.model.is_some()
    }

    /// Score one image file.
    pub fn analyze_image(&self, path: &Path) -> Result<QualityScore, QualityError> {
        let model = self.model.as_deref().ok_or(CapabilityError::Unavailable {
            capability: "aesthetic model",
        })?;

        let image = FastDecoder::decode(path)?;
        let metrics = self.measure(&image, path)?;
        let aesthetic = aesthetic_score(model, &image, path)?;

        Ok(self.combine(&metrics, aesthetic))
    }

    /// Sharpness, brightness and the optional metric of a decoded image.
    pub fn measure(&self, image: &DynamicImage, path: &Path) -> Result<TechnicalMetrics, QualityError> {
        let gray = luma_bt601(image);
        let gray = match self.config.working_width {
            Some(width) => FastResizer::new().fit_width(&gray, width)?,
            None => gray,
        };

        let brisque = match &self.metric {
            Some(metric) => Some(metric.score(&gray).map_err(|e| QualityError::Metric {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?),
            None => None,
        };

        Ok(TechnicalMetrics {
            laplacian: laplacian_variance(&gray),
            brightness: mean_brightness(&gray),
            brisque,
        })
    }

    /// Final score from measurements and a 0-100 aesthetic score.
    pub fn combine(&self, metrics: &TechnicalMetrics, aesthetic: f64) -> QualityScore {
        let laplacian_norm = (metrics.laplacian / (self.config.laplacian_max / 100.0)).min(100.0);

        let mut technical = match metrics.brisque {
            Some(brisque) if self.config.weights.brisque > 0.0 => {
                self.config.weights.laplacian * laplacian_norm
                    + self.config.weights.brisque * (100.0 - brisque.clamp(0.0, 100.0))
            }
            _ => laplacian_norm,
        };

        let penalty_applied =
            metrics.brightness < BRIGHTNESS_LOWER || metrics.brightness > BRIGHTNESS_UPPER;
        if penalty_applied {
            technical *= BRIGHTNESS_PENALTY;
        }

        let final_score = aesthetic * AESTHETIC_WEIGHT + technical * TECHNICAL_WEIGHT;

        QualityScore {
            final_score: round_to(final_score, 2),
            aesthetic: round_to(aesthetic, 2),
            technical: round_to(technical, 2),
            raw_metrics: RawMetrics {
                laplacian: round_to(metrics.laplacian, 1),
                brisque: round_to(metrics.brisque.unwrap_or(0.0), 1),
                brightness: round_to(metrics.brightness, 1),
            },
            penalty_applied,
        }
    }

    /// Score every image under `root`, best first.
    pub fn analyze_folder(&self, root: &Path) -> Result<QualityScan, ScanError> {
        self.analyze_folder_with(root, &ScanContext::silent())
    }

    pub fn analyze_folder_with(&self, root: &Path, ctx: &ScanContext) -> Result<QualityScan, ScanError> {
        if !self.is_active() {
            tracing::info!("No aesthetic model loaded; quality analysis is disabled");
            return Ok(QualityScan::default());
        }

        let walked = self.scanner.scan(root, &MediaFilter::any(), ctx)?;
        let images: Vec<PathBuf> = walked
            .files
            .iter()
            .filter(|entry| entry.category == FileCategory::Images)
            .map(|entry| entry.path.clone())
            .collect();

        let scored = extract_parallel(&images, AnalysisKind::Quality, ctx, |path| {
            let score = self.analyze_image(path)?;
            let entry = FileEntry::from_path(path)?;
            Ok::<_, EngineError>(QualityReport {
                path: entry.path,
                category: entry.category,
                size: entry.size,
                score,
            })
        })?;

        let mut results: Vec<QualityReport> = scored.items.into_iter().map(|(_, report)| report).collect();
        results.sort_by(|a, b| b.score.final_score.total_cmp(&a.score.final_score));

        tracing::info!(
            "Quality scan: {} scored, {} skipped",
            results.len(),
            scored.skipped.len()
        );

        Ok(QualityScan {
            active: true,
            results,
        })
    }
}

impl Default for HybridQualityScorer {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}

/// Softmax probability of the first prompt, in percent.
fn aesthetic_score(
    model: &dyn VisionLanguageModel,
    image: &DynamicImage,
    path: &Path,
) -> Result<f64, QualityError> {
    let model_error = |reason: String| QualityError::Model {
        path: path.to_path_buf(),
        reason,
    };

    let logits = model
        .logits(image, &AESTHETIC_PROMPTS)
        .map_err(|e| model_error(e.to_string()))?;

    if logits.len() != AESTHETIC_PROMPTS.len() {
        return Err(model_error(format!(
            "expected {} logits, got {}",
            AESTHETIC_PROMPTS.len(),
            logits.len()
        )));
    }

    Ok(softmax(&logits)[0] * 100.0)
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Luma, Rgb};
    use std::fs;
    use tempfile::TempDir;

    /// Scores every image with fixed logits
    struct FixedModel(Vec<f64>);

    impl VisionLanguageModel for FixedModel {
        fn logits(&self, _image: &DynamicImage, prompts: &[&str]) -> Result<Vec<f64>, CollaboratorError> {
            assert_eq!(prompts, AESTHETIC_PROMPTS);
            Ok(self.0.clone())
        }
    }

    struct FailingModel;

    impl VisionLanguageModel for FailingModel {
        fn logits(&self, _image: &DynamicImage, _prompts: &[&str]) -> Result<Vec<f64>, CollaboratorError> {
            Err("model crashed".into())
        }
    }

    struct FixedMetric(f64);

    impl NoReferenceMetric for FixedMetric {
        fn score(&self, _gray: &GrayImage) -> Result<f64, CollaboratorError> {
            Ok(self.0)
        }
    }

    fn create_uniform_image(value: u8, size: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(ImageBuffer::from_fn(size, size, |_, _| Luma([value])))
    }

    fn create_checkerboard_image(size: u32, dark: u8, light: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(size, size, |x, y| {
            let v = if (x / 2 + y / 2) % 2 == 0 { dark } else { light };
            Rgb([v, v, v])
        }))
    }

    fn save(dir: &Path, name: &str, image: &DynamicImage) -> PathBuf {
        let path = dir.join(name);
        image.save_with_format(&path, ImageFormat::Png).unwrap();
        path
    }

    fn metrics(laplacian: f64, brightness: f64) -> TechnicalMetrics {
        TechnicalMetrics {
            laplacian,
            brightness,
            brisque: None,
        }
    }

    #[test]
    fn canonical_config() {
        let config = QualityConfig::default();
        assert_eq!(config.laplacian_max, 1500.0);
        assert_eq!(config.working_width, None);
        assert_eq!(config.weights.brisque, 0.0);

        let blend = QualityConfig::brisque_blend();
        assert_eq!(blend.laplacian_max, 1000.0);
        assert_eq!(blend.working_width, Some(1024));
    }

    #[test]
    fn combine_weights_aesthetic_and_technical() {
        let scorer = HybridQualityScorer::default();

        // 750 / 15 = 50 technical
        let score = scorer.combine(&metrics(750.0, 120.0), 80.0);

        assert_eq!(score.technical, 50.0);
        assert_eq!(score.final_score, 69.5);
        assert!(!score.penalty_applied);
    }

    #[test]
    fn sharpness_is_capped_at_100() {
        let score = HybridQualityScorer::default().combine(&metrics(1_000_000.0, 120.0), 0.0);
        assert_eq!(score.technical, 100.0);
        assert_eq!(score.raw_metrics.laplacian, 1_000_000.0);
    }

    #[test]
    fn dark_and_bright_images_are_penalized() {
        let scorer = HybridQualityScorer::default();
        let normal = scorer.combine(&metrics(900.0, 128.0), 50.0);

        for brightness in [0.0, 29.9, 220.1, 255.0] {
            let penalized = scorer.combine(&metrics(900.0, brightness), 50.0);
            assert!(penalized.penalty_applied, "brightness {}", brightness);
            assert!(penalized.technical <= normal.technical * 0.5 + 1e-9);
        }
    }

    #[test]
    fn brisque_blends_when_weighted() {
        let scorer = HybridQualityScorer::new(QualityConfig::brisque_blend());
        let with_brisque = TechnicalMetrics {
            laplacian: 500.0,
            brightness: 128.0,
            brisque: Some(20.0),
        };

        // 0.6 * 50 + 0.4 * (100 - 20)
        let score = scorer.combine(&with_brisque, 0.0);
        assert_eq!(score.technical, 62.0);
        assert_eq!(score.raw_metrics.brisque, 20.0);

        let canonical = HybridQualityScorer::default().combine(&with_brisque, 0.0);
        assert_eq!(canonical.technical, round_to(500.0 / 15.0, 2));
    }

    #[test]
    fn softmax_of_equal_logits_is_even() {
        let probabilities = softmax(&[3.0, 3.0]);
        assert!((probabilities[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn black_image_gets_brightness_penalty() {
        let temp_dir = TempDir::new().unwrap();
        let path = save(temp_dir.path(), "black.png", &create_uniform_image(0, 32));

        let scorer = HybridQualityScorer::default().with_model(FixedModel(vec![0.0, 0.0]));
        let score = scorer.analyze_image(&path).unwrap();

        assert!(score.penalty_applied);
        assert_eq!(score.aesthetic, 50.0);
        assert_eq!(score.raw_metrics.brightness, 0.0);
        assert_eq!(score.final_score, 32.5);
    }

    #[test]
    fn white_image_technical_is_at_most_half() {
        let temp_dir = TempDir::new().unwrap();
        let path = save(temp_dir.path(), "white.png", &create_checkerboard_image(64, 235, 255));

        let scorer = HybridQualityScorer::default().with_model(FixedModel(vec![1.0, 0.0]));
        let score = scorer.analyze_image(&path).unwrap();

        let image = FastDecoder::decode(&path).unwrap();
        let measured = scorer.measure(&image, &path).unwrap();
        let unpenalized = (measured.laplacian / 15.0).min(100.0);

        assert!(score.penalty_applied);
        assert!(score.technical <= unpenalized * 0.5 + 0.01);
    }

    #[test]
    fn brightness_uses_bt601_luma() {
        let violet = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(16, 16, Rgb([40, 0, 255])));
        let scorer = HybridQualityScorer::default();

        let measured = scorer.measure(&violet, Path::new("violet.png")).unwrap();
        let score = scorer.combine(&measured, 50.0);

        assert_eq!(measured.brightness, 41.0);
        assert!(!score.penalty_applied);
    }

    #[test]
    fn analyze_without_model_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = save(temp_dir.path(), "a.png", &create_uniform_image(100, 16));

        let result = HybridQualityScorer::default().analyze_image(&path);
        assert!(matches!(result, Err(QualityError::Unavailable(_))));
    }

    #[test]
    fn model_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = save(temp_dir.path(), "a.png", &create_uniform_image(100, 16));

        let result = HybridQualityScorer::default().with_model(FailingModel).analyze_image(&path);
        assert!(matches!(result, Err(QualityError::Model { .. })));
    }

    #[test]
    fn wrong_logit_count_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = save(temp_dir.path(), "a.png", &create_uniform_image(100, 16));

        let result = HybridQualityScorer::default()
            .with_model(FixedModel(vec![1.0]))
            .analyze_image(&path);
        assert!(matches!(result, Err(QualityError::Model { .. })));
    }

    #[test]
    fn working_width_downscales_before_measuring() {
        let scorer = HybridQualityScorer::new(QualityConfig {
            working_width: Some(32),
            ..QualityConfig::default()
        })
        .with_metric(FixedMetric(10.0));

        let image = create_uniform_image(90, 128);
        let measured = scorer.measure(&image, Path::new("mem.png")).unwrap();

        assert_eq!(measured.brisque, Some(10.0));
        assert!((measured.brightness - 90.0).abs() <= 1.0);
    }

    #[test]
    fn folder_without_model_is_inactive() {
        let temp_dir = TempDir::new().unwrap();
        save(temp_dir.path(), "a.png", &create_uniform_image(100, 16));

        let scan = HybridQualityScorer::default().analyze_folder(temp_dir.path()).unwrap();

        assert!(!scan.active);
        assert!(scan.results.is_empty());
    }

    #[test]
    fn folder_results_are_sorted_and_skip_broken_files() {
        let temp_dir = TempDir::new().unwrap();
        save(temp_dir.path(), "flat.png", &create_uniform_image(128, 32));
        save(temp_dir.path(), "sharp.png", &create_checkerboard_image(32, 40, 200));
        fs::write(temp_dir.path().join("broken.jpg"), b"\xFF\xD8\xFF not a jpeg").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), b"not an image").unwrap();

        let scan = HybridQualityScorer::default()
            .with_model(FixedModel(vec![0.0, 0.0]))
            .analyze_folder(temp_dir.path())
            .unwrap();

        assert!(scan.active);
        let names: Vec<_> = scan
            .results
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["sharp.png", "flat.png"]);
        assert_eq!(scan.results[0].category, FileCategory::Images);
        assert!(scan.results[0].size > 0);
    }

    #[test]
    fn missing_root_is_error() {
        let scorer = HybridQualityScorer::default().with_model(FixedModel(vec![0.0, 0.0]));
        let result = scorer.analyze_folder(Path::new("/nonexistent/photos"));
        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }
}
