//! `VideoDecoder` backed by the ffmpeg and ffprobe command-line tools.

use super::{VideoDecoder, VideoStream};
use crate::error::{CapabilityError, VideoError};
use image::DynamicImage;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const CAPABILITY: &str = "ffmpeg video decoder";

/// Spawns ffprobe for frame counts and ffmpeg for single frames
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegDecoder {
    /// Use `ffmpeg`/`ffprobe` from `PATH`, failing if either cannot run.
    pub fn probe() -> Result<Self, CapabilityError> {
        Self::probe_with("ffmpeg", "ffprobe")
    }

    /// Use explicit binaries, failing if either cannot run.
    pub fn probe_with(
        ffmpeg: impl Into<PathBuf>,
        ffprobe: impl Into<PathBuf>,
    ) -> Result<Self, CapabilityError> {
        let decoder = Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        };

        if runs(&decoder.ffmpeg) && runs(&decoder.ffprobe) {
            tracing::debug!("Using {} and {}", decoder.ffmpeg.display(), decoder.ffprobe.display());
            Ok(decoder)
        } else {
            tracing::info!("ffmpeg/ffprobe not found; video scanning disabled");
            Err(CapabilityError::Unavailable {
                capability: CAPABILITY,
            })
        }
    }

    /// Frame count and frame rate of the first video stream. The count is the
    /// container's `nb_frames`, else a packet count.
    fn stream_info(&self, path: &Path) -> Result<(i64, Option<f64>), VideoError> {
        let probed = self.probe_stream(path, &["-show_entries", "stream=nb_frames,r_frame_rate"])?;
        let frame_rate = stream_rate(&probed, "r_frame_rate");
        if let Some(count) = stream_field(&probed, "nb_frames") {
            return Ok((count, frame_rate));
        }

        let counted = self.probe_stream(
            path,
            &["-count_packets", "-show_entries", "stream=nb_read_packets"],
        )?;
        Ok((stream_field(&counted, "nb_read_packets").unwrap_or(0), frame_rate))
    }

    fn probe_stream(&self, path: &Path, entries: &[&str]) -> Result<Value, VideoError> {
        let open_failed = |reason: String| VideoError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(entries)
            .args(["-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| open_failed(format!("cannot run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(open_failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| open_failed(format!("unreadable ffprobe output: {}", e)))
    }
}

impl VideoDecoder for FfmpegDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoStream>, VideoError> {
        if !path.is_file() {
            return Err(VideoError::OpenFailed {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let (frame_count, frame_rate) = self.stream_info(path)?;
        if frame_rate.is_none() {
            tracing::debug!(
                "No frame rate for {}; frames are selected by decoding from the start",
                path.display()
            );
        }

        Ok(Box::new(FfmpegStream {
            ffmpeg: self.ffmpeg.clone(),
            path: path.to_path_buf(),
            frame_count,
            frame_rate,
        }))
    }
}

struct FfmpegStream {
    ffmpeg: PathBuf,
    path: PathBuf,
    frame_count: i64,
    /// Frames per second, when ffprobe reports a usable rate
    frame_rate: Option<f64>,
}

impl FfmpegStream {
    fn decode_frame(&self, index: u64) -> Result<DynamicImage, VideoError> {
        let frame_error = |reason: String| VideoError::FrameDecode {
            path: self.path.clone(),
            index,
            reason,
        };

        let mut command = Command::new(&self.ffmpeg);
        command.args(["-v", "error"]);
        match self.frame_rate {
            // Input-side seek: demuxing jumps to the nearest keyframe and only
            // the frames from there to the target are decoded.
            Some(rate) => {
                let timestamp = seek_timestamp(index, rate);
                command.args(["-ss", timestamp.as_str(), "-i"]).arg(&self.path);
            }
            None => {
                let select = format!("select=eq(n\\,{})", index);
                command
                    .arg("-i")
                    .arg(&self.path)
                    .args(["-vf", select.as_str(), "-vsync", "0"]);
            }
        }

        let output = command
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| frame_error(format!("cannot run ffmpeg: {}", e)))?;

        if !output.status.success() || output.stdout.is_empty() {
            return Err(frame_error(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let frame = image::load_from_memory(&output.stdout)
            .map_err(|e| frame_error(e.to_string()))?;
        Ok(DynamicImage::ImageRgb8(frame.to_rgb8()))
    }
}

impl VideoStream for FfmpegStream {
    fn frame_count(&self) -> i64 {
        self.frame_count
    }

    fn read_frame(&mut self, index: u64) -> Option<DynamicImage> {
        match self.decode_frame(index) {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::debug!("{}", e);
                None
            }
        }
    }
}

fn runs(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Seconds, to the microsecond, half a frame ahead of frame `index`, so the
/// first frame ffmpeg keeps after an accurate seek is that frame.
fn seek_timestamp(index: u64, frame_rate: f64) -> String {
    let seconds = (index as f64 - 0.5).max(0.0) / frame_rate;
    format!("{:.6}", seconds)
}

/// Rates come as fractions ("30000/1001"); "0/0" means unknown.
fn stream_rate(probed: &Value, field: &str) -> Option<f64> {
    let value = probed.get("streams")?.as_array()?.first()?.get(field)?.as_str()?;
    let rate = match value.split_once('/') {
        Some((num, den)) => num.trim().parse::<f64>().ok()? / den.trim().parse::<f64>().ok()?,
        None => value.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// ffprobe reports counts as strings ("240") or "N/A".
fn stream_field(probed: &Value, field: &str) -> Option<i64> {
    let value = probed.get("streams")?.as_array()?.first()?.get(field)?;
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}
