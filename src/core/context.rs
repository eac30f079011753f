//! Per-scan context: progress events plus cooperative cancellation.

use crate::error::ScanError;
use crate::events::{
    null_sender, AnalysisKind, AnalyzeEvent, AnalyzeProgress, Event, EventSender,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a caller and a running scan.
///
/// Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Running scans stop before their next item.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Everything a scan needs besides its inputs.
#[derive(Clone)]
pub struct ScanContext {
    pub events: EventSender,
    pub cancel: CancellationToken,
}

impl ScanContext {
    pub fn new(events: EventSender, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// A context that drops every event and is never cancelled.
    pub fn silent() -> Self {
        Self {
            events: null_sender(),
            cancel: CancellationToken::new(),
        }
    }

    /// Fail with `ScanError::Cancelled` if cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), ScanError> {
        if self.cancel.is_cancelled() {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for ScanContext {
    fn default() -> Self {
        Self::silent()
    }
}

/// A file left out of a scan result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Output of [`extract_parallel`]
#[derive(Debug)]
pub(crate) struct Extracted<T> {
    /// Successful extractions, in input order
    pub items: Vec<(PathBuf, T)>,
    /// Failed extractions, in input order
    pub skipped: Vec<SkippedFile>,
}

/// Run `extract` over every path on the rayon pool.
///
/// Results come back in input order. Failures are logged, reported as
/// `AnalyzeEvent::Skipped` and collected separately. Cancellation is checked
/// before each item; a cancelled run returns `ScanError::Cancelled`.
pub(crate) fn extract_parallel<T, E, F>(
    paths: &[PathBuf],
    kind: AnalysisKind,
    ctx: &ScanContext,
    extract: F,
) -> Result<Extracted<T>, ScanError>
where
    T: Send,
    E: Display,
    F: Fn(&Path) -> Result<T, E> + Sync,
{
    let total = paths.len();
    ctx.events
        .send(Event::Analyze(AnalyzeEvent::Started { kind, total }));

    let completed = AtomicUsize::new(0);

    let results: Vec<Option<Result<(PathBuf, T), SkippedFile>>> = paths
        .par_iter()
        .map(|path| {
            if ctx.cancel.is_cancelled() {
                return None;
            }

            let outcome = match extract(path) {
                Ok(value) => Ok((path.clone(), value)),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    ctx.events.send(Event::Analyze(AnalyzeEvent::Skipped {
                        kind,
                        path: path.clone(),
                        message: e.to_string(),
                    }));
                    Err(SkippedFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    })
                }
            };

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if ctx.events.is_attached() {
                ctx.events
                    .send(Event::Analyze(AnalyzeEvent::Progress(AnalyzeProgress {
                        kind,
                        completed: done,
                        total,
                        current_path: path.clone(),
                    })));
            }

            Some(outcome)
        })
        .collect();

    ctx.checkpoint()?;

    let mut items = Vec::new();
    let mut skipped = Vec::new();
    for outcome in results.into_iter().flatten() {
        match outcome {
            Ok(item) => items.push(item),
            Err(skip) => skipped.push(skip),
        }
    }

    ctx.events.send(Event::Analyze(AnalyzeEvent::Completed {
        kind,
        analyzed: items.len(),
        skipped: skipped.len(),
    }));

    Ok(Extracted { items, skipped })
}
