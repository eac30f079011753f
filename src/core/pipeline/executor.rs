//! Pipeline execution implementation.

use crate::core::comparator::SimilarityGroup;
use crate::core::context::ScanContext;
use crate::core::digest::{find_exact_duplicates_with, ExactDuplicateReport};
use crate::core::document::{DocumentConfig, DocumentEngine};
use crate::core::quality::{
    HybridQualityScorer, NoReferenceMetric, QualityConfig, QualityScan, VisionLanguageModel,
};
use crate::core::scanner::{ScanConfig, WalkDirScanner};
use crate::core::similar::ImageSimilarityEngine;
use crate::core::video::{VideoDecoder, VideoFingerprintEngine};
use crate::error::{EngineError, ScanError};
use crate::events::{Event, PipelineEvent, PipelinePhase, PipelineSummary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Which categories a unified scan covers, with their thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnifiedScanRequest {
    /// Max Hamming distance for images
    pub images: Option<u32>,
    /// Min matched-frame percentage for videos
    pub videos: Option<f64>,
    /// Min matching-ratio percentage for documents
    pub documents: Option<f64>,
}

impl Default for UnifiedScanRequest {
    fn default() -> Self {
        Self {
            images: Some(10),
            videos: Some(60.0),
            documents: Some(75.0),
        }
    }
}

/// What happened to one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum CategoryOutcome {
    /// Not requested
    Skipped,
    Completed(Vec<SimilarityGroup>),
    /// The category could not run; the message says why
    Failed(String),
}

impl CategoryOutcome {
    /// Groups found, empty unless completed
    pub fn groups(&self) -> &[SimilarityGroup] {
        match self {
            CategoryOutcome::Completed(groups) => groups,
            _ => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CategoryOutcome::Failed(_))
    }
}

/// Result of [`Pipeline::run_unified`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedScanResult {
    pub root: PathBuf,
    pub images: CategoryOutcome,
    pub videos: CategoryOutcome,
    pub documents: CategoryOutcome,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl UnifiedScanResult {
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            image_groups: self.images.groups().len(),
            video_groups: self.videos.groups().len(),
            document_groups: self.documents.groups().len(),
            failed_phases: [&self.images, &self.videos, &self.documents]
                .iter()
                .filter(|outcome| outcome.is_failed())
                .count(),
            duration_ms: self.duration_ms,
        }
    }
}

enum VideoBackend {
    /// Look for ffmpeg when building
    Probe,
    Disabled,
    Custom(Arc<dyn VideoDecoder>),
}

/// Builder wiring the engines and their optional collaborators
pub struct PipelineBuilder {
    scan_config: ScanConfig,
    document_config: DocumentConfig,
    quality_config: QualityConfig,
    video: VideoBackend,
    model: Option<Arc<dyn VisionLanguageModel>>,
    metric: Option<Arc<dyn NoReferenceMetric>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            scan_config: ScanConfig::default(),
            document_config: DocumentConfig::default(),
            quality_config: QualityConfig::default(),
            video: VideoBackend::Probe,
            model: None,
            metric: None,
        }
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.scan_config.include_hidden = include;
        self
    }

    pub fn document_config(mut self, config: DocumentConfig) -> Self {
        self.document_config = config;
        self
    }

    pub fn quality_config(mut self, config: QualityConfig) -> Self {
        self.quality_config = config;
        self
    }

    /// Use this decoder instead of probing for ffmpeg
    pub fn video_decoder(mut self, decoder: impl VideoDecoder + 'static) -> Self {
        self.video = VideoBackend::Custom(Arc::new(decoder));
        self
    }

    /// Turn video scanning off
    pub fn without_video(mut self) -> Self {
        self.video = VideoBackend::Disabled;
        self
    }

    /// Aesthetic model for quality analysis
    pub fn aesthetic_model(mut self, model: impl VisionLanguageModel + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    /// No-reference metric blended into the technical score
    pub fn quality_metric(mut self, metric: impl NoReferenceMetric + 'static) -> Self {
        self.metric = Some(Arc::new(metric));
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let walker = || WalkDirScanner::new(self.scan_config.clone());

        let videos = match self.video {
            VideoBackend::Probe => VideoFingerprintEngine::new(),
            VideoBackend::Disabled => VideoFingerprintEngine::unavailable(),
            VideoBackend::Custom(decoder) => VideoFingerprintEngine::with_shared_decoder(decoder),
        }
        .with_scanner(walker());

        let quality = HybridQualityScorer::new(self.quality_config)
            .with_shared_model(self.model)
            .with_shared_metric(self.metric)
            .with_scanner(walker());

        Pipeline {
            images: ImageSimilarityEngine::new().with_scanner(walker()),
            videos,
            documents: DocumentEngine::new(self.document_config).with_scanner(walker()),
            quality,
            scan_config: self.scan_config.clone(),
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// All engines, configured once
pub struct Pipeline {
    images: ImageSimilarityEngine,
    videos: VideoFingerprintEngine,
    documents: DocumentEngine,
    quality: HybridQualityScorer,
    scan_config: ScanConfig,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn images(&self) -> &ImageSimilarityEngine {
        &self.images
    }

    pub fn videos(&self) -> &VideoFingerprintEngine {
        &self.videos
    }

    pub fn documents(&self) -> &DocumentEngine {
        &self.documents
    }

    pub fn quality(&self) -> &HybridQualityScorer {
        &self.quality
    }

    pub fn exact_duplicates(&self, root: &Path, ctx: &ScanContext) -> Result<ExactDuplicateReport, ScanError> {
        find_exact_duplicates_with(root, &self.scan_config, ctx)
    }

    pub fn analyze_quality(&self, root: &Path, ctx: &ScanContext) -> Result<QualityScan, ScanError> {
        self.quality.analyze_folder_with(root, ctx)
    }

    /// Run the requested categories without events
    pub fn run_unified(&self, root: &Path, request: &UnifiedScanRequest) -> Result<UnifiedScanResult, EngineError> {
        self.run_unified_with(root, request, &ScanContext::silent())
    }

    /// Run the requested categories over one root.
    ///
    /// A missing root or cancellation fails the whole scan. Any other failure
    /// is confined to its category.
    pub fn run_unified_with(
        &self,
        root: &Path,
        request: &UnifiedScanRequest,
        ctx: &ScanContext,
    ) -> Result<UnifiedScanResult, EngineError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            }
            .into());
        }

        let result = self.run_categories(root, request, ctx);
        if matches!(result, Err(EngineError::Scan(ScanError::Cancelled))) {
            tracing::info!("Unified scan of {} cancelled", root.display());
            ctx.events.send(Event::Pipeline(PipelineEvent::Cancelled));
        }
        result
    }

    fn run_categories(
        &self,
        root: &Path,
        request: &UnifiedScanRequest,
        ctx: &ScanContext,
    ) -> Result<UnifiedScanResult, EngineError> {
        let start_time = Instant::now();
        ctx.events.send(Event::Pipeline(PipelineEvent::Started));

        let images = run_phase(PipelinePhase::Images, request.images, ctx, |threshold| {
            Ok(self.images.scan_folder_with(root, threshold, ctx)?)
        })?;

        let videos = run_phase(PipelinePhase::Videos, request.videos, ctx, |threshold| {
            self.videos.scan_folder_with(root, threshold, ctx)
        })?;

        let documents = run_phase(PipelinePhase::Documents, request.documents, ctx, |threshold| {
            Ok(self.documents.scan_folder_with(root, threshold, ctx)?)
        })?;

        let result = UnifiedScanResult {
            root: root.to_path_buf(),
            images,
            videos,
            documents,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        ctx.events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: result.summary(),
        }));

        Ok(result)
    }
}

/// Run one category if requested, keeping its failure local.
fn run_phase<T>(
    phase: PipelinePhase,
    setting: Option<T>,
    ctx: &ScanContext,
    scan: impl FnOnce(T) -> Result<Vec<SimilarityGroup>, EngineError>,
) -> Result<CategoryOutcome, EngineError> {
    let Some(threshold) = setting else {
        return Ok(CategoryOutcome::Skipped);
    };

    ctx.checkpoint()?;
    ctx.events
        .send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));

    match scan(threshold) {
        Ok(groups) => Ok(CategoryOutcome::Completed(groups)),
        Err(EngineError::Scan(ScanError::Cancelled)) => Err(ScanError::Cancelled.into()),
        Err(e) => {
            let message = e.to_string();
            tracing::warn!("{} scan failed: {}", phase, message);
            ctx.events.send(Event::Pipeline(PipelineEvent::PhaseFailed {
                phase,
                message: message.clone(),
            }));
            Ok(CategoryOutcome::Failed(message))
        }
    }
}
