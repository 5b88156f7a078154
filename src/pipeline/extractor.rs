//! Frame extraction via an external ffmpeg process.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;

use crate::models::snapshot::ImageFormat;
use crate::pipeline::{PipelineError, Precondition};

/// First digit run embedded in a frame file stem, e.g. `000042` in
/// `000042.jpg` or `frame_7` in `frame_7.png`.
static FRAME_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid frame index pattern"));

/// Invoke ffmpeg to emit one image per sampled instant into `out_dir`,
/// then return the frame files in numeric filename order.
///
/// Fails with `NotFound` before spawning if the source video is absent and
/// with `ExternalTool` if ffmpeg exits non-zero. On decoder failure any
/// partially written frames are left on disk for inspection.
pub async fn extract_frames(
    ffmpeg_bin: &str,
    video_path: &Path,
    out_dir: &Path,
    sampling_fps: f64,
    format: ImageFormat,
) -> Result<Vec<PathBuf>, PipelineError> {
    if !(sampling_fps > 0.0) {
        return Err(PipelineError::Precondition(
            Precondition::NonPositiveSamplingRate,
        ));
    }
    if !video_path.exists() {
        return Err(PipelineError::NotFound {
            what: format!("video file {}", video_path.display()),
        });
    }

    tokio::fs::create_dir_all(out_dir).await?;
    let out_pattern = out_dir.join(format!("%06d.{format}"));

    let status = Command::new(ffmpeg_bin)
        .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(video_path)
        .args(["-vf", &format!("fps={sampling_fps}")])
        .arg(&out_pattern)
        .status()
        .await?;

    if !status.success() {
        return Err(PipelineError::ExternalTool { status });
    }

    sorted_frame_files(out_dir, format).map_err(PipelineError::Io)
}

/// Sort key for frame files: numeric index first, then stems without any
/// digits, ordered by raw stem. Numeric order matters once indices grow
/// past the zero-padded width (`999999.jpg` < `1000000.jpg`).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum FrameKey {
    Indexed(u64),
    Unindexed(String),
}

fn frame_key(path: &Path) -> FrameKey {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match FRAME_INDEX
        .find(&stem)
        .and_then(|m| m.as_str().parse::<u64>().ok())
    {
        Some(n) => FrameKey::Indexed(n),
        None => FrameKey::Unindexed(stem),
    }
}

/// List `*.{format}` files in `dir` sorted by embedded frame index.
/// This ordering is established once and is authoritative for timestamp
/// assignment downstream.
pub fn sorted_frame_files(dir: &Path, format: ImageFormat) -> std::io::Result<Vec<PathBuf>> {
    let ext = format.to_string();
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|e| e.to_string_lossy() == ext)
                .unwrap_or(false)
        })
        .collect();
    files.sort_by_key(|path| frame_key(path));
    Ok(files)
}
