//! # CLI Module
//!
//! Command-line interface for the content deduplication engine.
//!
//! ## Usage
//! ```bash
//! # Byte-identical files
//! content-dedup exact ~/Downloads
//!
//! # Similar images under a Hamming threshold
//! content-dedup images ~/Photos --threshold 8
//!
//! # Everything at once, as JSON
//! content-dedup scan ~/Archive --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use content_dedup::core::comparator::{hamming_threshold_from_percent, SimilarityGroup};
use content_dedup::core::context::{CancellationToken, ScanContext};
use content_dedup::core::digest::{format_bytes, DuplicateStatistics, ExactDuplicateReport};
use content_dedup::core::document::{DocumentConfig, DEFAULT_SIMILARITY_PERCENT as DOC_SIMILARITY};
use content_dedup::core::pipeline::{CategoryOutcome, Pipeline, UnifiedScanRequest, UnifiedScanResult};
use content_dedup::core::quality::QualityScan;
use content_dedup::core::similar::{PairVerdict, DEFAULT_HAMMING_THRESHOLD};
use content_dedup::core::video::DEFAULT_SIMILARITY_PERCENT as VIDEO_SIMILARITY;
use content_dedup::error::Result;
use content_dedup::events::{AnalyzeEvent, Event, EventChannel, EventReceiver, PipelineEvent};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Content Dedup - find duplicate files, images, videos and documents
#[derive(Parser, Debug)]
#[command(name = "content-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Skip hidden files and directories
    #[arg(long, global = true)]
    skip_hidden: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find byte-identical files under a directory
    Exact {
        /// Directory to scan
        root: PathBuf,
    },

    /// Compare two images
    Compare {
        first: PathBuf,
        second: PathBuf,

        /// pHash similarity (%) needed to call them similar
        #[arg(short, long, default_value = "95")]
        similarity: f64,
    },

    /// Group similar images
    Images {
        /// A directory, or a list of image files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Max differing hash bits (lower = stricter, 0-64)
        #[arg(short, long, conflicts_with = "similarity")]
        threshold: Option<u32>,

        /// Min similarity (%), converted to a Hamming threshold
        #[arg(short, long)]
        similarity: Option<f64>,
    },

    /// Group similar videos (needs ffmpeg and ffprobe on PATH)
    Videos {
        /// A directory, or a list of video files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Min percentage of matching sampled frames
        #[arg(short, long, default_value_t = VIDEO_SIMILARITY)]
        similarity: f64,
    },

    /// Group documents with similar text
    Docs {
        /// A directory, or a list of documents
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Min text matching ratio (%)
        #[arg(short, long, default_value_t = DOC_SIMILARITY)]
        similarity: f64,

        /// Characters compared per document
        #[arg(long, default_value = "3000")]
        max_chars: usize,
    },

    /// Rank images under a directory by quality (needs an aesthetic model)
    ///
    /// This binary ships no aesthetic model, so every image is reported
    /// with the ranking marked inactive. Library callers can attach a model
    /// through `HybridQualityScorer::with_model`.
    Quality {
        /// Directory to scan
        root: PathBuf,
    },

    /// Run image, video and document grouping over one directory
    Scan {
        /// Directory to scan
        root: PathBuf,

        #[arg(long)]
        no_images: bool,

        #[arg(long)]
        no_videos: bool,

        #[arg(long)]
        no_docs: bool,

        /// Max differing hash bits for images
        #[arg(long, default_value_t = DEFAULT_HAMMING_THRESHOLD)]
        image_threshold: u32,

        /// Min matching-frame percentage for videos
        #[arg(long, default_value_t = VIDEO_SIMILARITY)]
        video_similarity: f64,

        /// Min text matching ratio for documents
        #[arg(long, default_value_t = DOC_SIMILARITY)]
        doc_similarity: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    content_dedup::init_tracing(cli.verbose);

    let term = Term::stderr();
    let pretty = cli.output == OutputFormat::Pretty;

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Content Dedup").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let builder = Pipeline::builder().include_hidden(!cli.skip_hidden);

    match cli.command {
        Commands::Exact { root } => {
            let pipeline = builder.without_video().build();
            let report = with_progress(pretty, |ctx| pipeline.exact_duplicates(&root, ctx))?;
            match cli.output {
                OutputFormat::Pretty => print_exact(&term, &report),
                OutputFormat::Json => print_json(&ExactOutput {
                    statistics: DuplicateStatistics::from_report(&report),
                    report: &report,
                }),
            }
        }

        Commands::Compare { first, second, similarity } => {
            let pipeline = builder.without_video().build();
            let verdict = pipeline.images().compare_files(&first, &second, similarity);
            match cli.output {
                OutputFormat::Pretty => print_verdict(&term, verdict.as_ref()),
                OutputFormat::Json => print_json(&verdict),
            }
        }

        Commands::Images { paths, threshold, similarity } => {
            let threshold = match (threshold, similarity) {
                (Some(bits), _) => bits,
                (None, Some(percent)) => hamming_threshold_from_percent(percent),
                (None, None) => DEFAULT_HAMMING_THRESHOLD,
            };
            let pipeline = builder.without_video().build();
            let groups = with_progress(pretty, |ctx| match single_directory(&paths) {
                Some(root) => pipeline.images().scan_folder_with(root, threshold, ctx),
                None => pipeline.images().scan_file_list_with(&paths, threshold, ctx),
            })?;
            emit_groups(&term, cli.output, "Similar Images", &groups, cli.verbose);
        }

        Commands::Videos { paths, similarity } => {
            let pipeline = builder.build();
            let groups = with_progress(pretty, |ctx| match single_directory(&paths) {
                Some(root) => pipeline.videos().scan_folder_with(root, similarity, ctx),
                None => pipeline.videos().scan_file_list_with(&paths, similarity, ctx),
            })?;
            emit_groups(&term, cli.output, "Similar Videos", &groups, cli.verbose);
        }

        Commands::Docs { paths, similarity, max_chars } => {
            let pipeline = builder
                .without_video()
                .document_config(DocumentConfig::default().with_max_chars(max_chars))
                .build();
            let groups = with_progress(pretty, |ctx| match single_directory(&paths) {
                Some(root) => pipeline.documents().scan_folder_with(root, similarity, ctx),
                None => pipeline.documents().scan_file_list_with(&paths, similarity, ctx),
            })?;
            emit_groups(&term, cli.output, "Similar Documents", &groups, cli.verbose);
        }

        Commands::Quality { root } => {
            let pipeline = builder.without_video().build();
            let scan = with_progress(pretty, |ctx| pipeline.analyze_quality(&root, ctx))?;
            match cli.output {
                OutputFormat::Pretty => print_quality(&term, &scan),
                OutputFormat::Json => print_json(&scan),
            }
        }

        Commands::Scan {
            root,
            no_images,
            no_videos,
            no_docs,
            image_threshold,
            video_similarity,
            doc_similarity,
        } => {
            let request = UnifiedScanRequest {
                images: (!no_images).then_some(image_threshold),
                videos: (!no_videos).then_some(video_similarity),
                documents: (!no_docs).then_some(doc_similarity),
            };
            let pipeline = if no_videos { builder.without_video() } else { builder }.build();
            let result = with_progress(pretty, |ctx| pipeline.run_unified_with(&root, &request, ctx))?;
            match cli.output {
                OutputFormat::Pretty => print_unified(&term, &result, cli.verbose),
                OutputFormat::Json => print_json(&result),
            }
        }
    }

    if pretty {
        term.write_line(&format!(
            "{}",
            style("Remember: No files were deleted. Review carefully before taking action.").dim()
        ))
        .ok();
    }

    Ok(())
}

/// The only directory in `paths`, if that is all there is
fn single_directory(paths: &[PathBuf]) -> Option<&Path> {
    match paths {
        [only] if only.is_dir() => Some(only.as_path()),
        _ => None,
    }
}

/// Run `job` with a scan context, drawing a progress bar from its events
/// when the output is interactive.
fn with_progress<T, E>(pretty: bool, job: impl FnOnce(&ScanContext) -> std::result::Result<T, E>) -> std::result::Result<T, E> {
    let (sender, receiver) = EventChannel::new();
    let ctx = ScanContext::new(sender, CancellationToken::new());

    let progress = pretty.then(new_progress_bar);
    let event_thread = spawn_event_thread(receiver, progress.clone());

    let result = job(&ctx);

    // Drop the context so the event thread sees the channel close
    drop(ctx);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    result
}

fn new_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

fn spawn_event_thread(receiver: EventReceiver, progress: Option<ProgressBar>) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Pipeline(PipelineEvent::PhaseFailed { phase, message }) => {
                    pb.println(format!("{} {}: {}", style("!").yellow(), phase, message));
                }
                Event::Analyze(AnalyzeEvent::Started { kind, total }) => {
                    pb.set_length(total as u64);
                    pb.set_position(0);
                    pb.set_message(format!("{}", kind));
                }
                Event::Analyze(AnalyzeEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Cancelled) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    })
}

#[derive(Serialize)]
struct ExactOutput<'a> {
    statistics: DuplicateStatistics,
    report: &'a ExactDuplicateReport,
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Cannot serialize output: {}", e),
    }
}

fn print_exact(term: &Term, report: &ExactDuplicateReport) {
    let stats = DuplicateStatistics::from_report(report);

    term.write_line(&format!("{} Scan Complete", style("✓").green().bold())).ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} files scanned ({})",
        style(stats.total_files).cyan(),
        format_bytes(stats.total_size)
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate sets, {} extra copies",
        style(report.sets.len()).cyan(),
        style(stats.total_duplicates).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(stats.reclaimable_bytes)).yellow()
    ))
    .ok();
    for (category, bytes) in &stats.space_by_category {
        term.write_line(&format!("    {:<10} {}", category, format_bytes(*bytes))).ok();
    }
    if !report.skipped.is_empty() {
        term.write_line(&format!("  {} files skipped", style(report.skipped.len()).dim())).ok();
    }
    term.write_line("").ok();

    if report.sets.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green())).ok();
        term.write_line("").ok();
        return;
    }

    for (i, set) in report.sets.iter().enumerate() {
        let md5 = set.digest.md5_hex();
        term.write_line(&format!(
            "  {} {} ({} files)",
            style(format!("Set {}:", i + 1)).bold(),
            style(&md5[..12]).dim(),
            set.paths.len()
        ))
        .ok();
        for (idx, path) in set.paths.iter().enumerate() {
            let marker = if idx == 0 {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };
            term.write_line(&format!("    {} {}", marker, path.display())).ok();
        }
        term.write_line("").ok();
    }
}

fn print_verdict(term: &Term, verdict: Option<&PairVerdict>) {
    let Some(verdict) = verdict else {
        term.write_line(&format!(
            "{} Could not compare the images (run with --verbose for details)",
            style("✗").red().bold()
        ))
        .ok();
        return;
    };

    let headline = if verdict.is_similar {
        style("Similar").green().bold()
    } else {
        style("Different").yellow().bold()
    };
    term.write_line(&format!("{} (threshold {:.1}%)", headline, verdict.threshold_percent)).ok();
    term.write_line(&format!("  pHash  {:>6.2}%", verdict.similarity.phash_percent)).ok();
    term.write_line(&format!("  SSIM   {:>6.2}%", verdict.similarity.ssim_percent)).ok();
    term.write_line(&format!("  bits   {:>6}", verdict.similarity.hamming_distance)).ok();
    term.write_line("").ok();
}

fn emit_groups(term: &Term, output: OutputFormat, title: &str, groups: &[SimilarityGroup], verbose: bool) {
    match output {
        OutputFormat::Pretty => print_groups(term, title, groups, verbose),
        OutputFormat::Json => print_json(&groups),
    }
}

fn print_groups(term: &Term, title: &str, groups: &[SimilarityGroup], verbose: bool) {
    if groups.is_empty() {
        term.write_line(&format!("  {} {}: none found", style("🎉").green(), title)).ok();
        term.write_line("").ok();
        return;
    }

    let duplicates: usize = groups.iter().map(SimilarityGroup::duplicate_count).sum();
    term.write_line(&format!(
        "{} ({} groups, {} duplicates)",
        style(title).bold().underlined(),
        groups.len(),
        duplicates
    ))
    .ok();
    term.write_line("").ok();

    for (i, group) in groups.iter().enumerate() {
        term.write_line(&format!(
            "  {} ({} files)",
            style(format!("Group {}:", i + 1)).bold(),
            group.len()
        ))
        .ok();

        for (idx, member) in group.members.iter().enumerate() {
            let marker = if idx == 0 {
                style("★").green().to_string()
            } else {
                style("○").dim().to_string()
            };
            term.write_line(&format!(
                "    {} {:>6.1}%  {}",
                marker,
                member.score,
                member.path.display()
            ))
            .ok();
        }

        if verbose {
            term.write_line(&format!(
                "    {} {}",
                style("Recommended:").dim(),
                style("Keep the starred (★) file").dim()
            ))
            .ok();
        }
        term.write_line("").ok();
    }
}

fn print_quality(term: &Term, scan: &QualityScan) {
    if !scan.active {
        term.write_line(&format!(
            "{} No aesthetic model is loaded; quality ranking is inactive.",
            style("!").yellow().bold()
        ))
        .ok();
        term.write_line("").ok();
        return;
    }

    term.write_line(&format!(
        "{} ({} images, best first)",
        style("Image Quality").bold().underlined(),
        scan.results.len()
    ))
    .ok();
    term.write_line("").ok();

    for (rank, report) in scan.results.iter().enumerate() {
        let score = &report.score;
        let penalty = if score.penalty_applied {
            style(" dark/bright").red().to_string()
        } else {
            String::new()
        };
        term.write_line(&format!(
            "  {:>3}. {:>6.2}  (aesthetic {:>6.2}, technical {:>6.2}){}  {}",
            rank + 1,
            score.final_score,
            score.aesthetic,
            score.technical,
            penalty,
            report.path.display()
        ))
        .ok();
    }
    term.write_line("").ok();
}

fn print_unified(term: &Term, result: &UnifiedScanResult, verbose: bool) {
    let summary = result.summary();
    term.write_line(&format!(
        "{} Scan of {} complete in {:.1}s",
        style("✓").green().bold(),
        result.root.display(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line("").ok();

    let categories = [
        ("Similar Images", &result.images),
        ("Similar Videos", &result.videos),
        ("Similar Documents", &result.documents),
    ];

    for (title, outcome) in categories {
        match outcome {
            CategoryOutcome::Skipped => {
                term.write_line(&format!("  {} {}: skipped", style("-").dim(), title)).ok();
                term.write_line("").ok();
            }
            CategoryOutcome::Failed(message) => {
                term.write_line(&format!("  {} {}: {}", style("✗").red().bold(), title, message)).ok();
                term.write_line("").ok();
            }
            CategoryOutcome::Completed(groups) => print_groups(term, title, groups, verbose),
        }
    }
}
