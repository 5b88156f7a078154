//! Extraction-and-segmentation pipeline.
//!
//! `run_extraction` drives one extraction run end to end: invoke the frame
//! decoder, preprocess every frame in place, then persist the snapshot
//! timeline as a single batch. Scene building (`segmenter`) and keyframe
//! selection (`keyframes`) run independently of extraction.

pub mod extractor;
pub mod keyframes;
pub mod preprocess;
pub mod recorder;
pub mod segmenter;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::services::storage::LocalStorage;

/// Distinct reasons a pipeline stage can refuse to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    MissingConfig,
    NonPositiveSamplingRate,
    NonPositiveChunkLength,
    NoSnapshots,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::MissingConfig => write!(f, "job has no snapshot config"),
            Precondition::NonPositiveSamplingRate => write!(f, "sampling_fps must be > 0"),
            Precondition::NonPositiveChunkLength => write!(f, "chunk_length_sec must be > 0"),
            Precondition::NoSnapshots => {
                write!(f, "job has no snapshots; run extraction first")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("precondition failed: {0}")]
    Precondition(Precondition),

    #[error("frame decoder exited with {status}")]
    ExternalTool { status: ExitStatus },

    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("preprocessing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outcome of one extraction run.
#[derive(Debug)]
pub struct ExtractionSummary {
    pub frames: usize,
    pub unreadable: usize,
    pub snapshots_dir: PathBuf,
}

/// Run extraction for one job: decode frames at the configured sampling
/// rate, preprocess each in place, persist the snapshot batch atomically.
///
/// Callers must serialize runs per job (the extract endpoint does this via
/// a status check-and-set); two concurrent runs for one job would collide
/// on snapshot timestamps.
pub async fn run_extraction(
    pool: &PgPool,
    storage: &LocalStorage,
    ffmpeg_bin: &str,
    job_id: Uuid,
) -> Result<ExtractionSummary, PipelineError> {
    let cfg = queries::get_config(pool, job_id)
        .await?
        .ok_or_else(|| PipelineError::NotFound {
            what: format!("snapshot config for job {job_id}"),
        })?;
    let asset = queries::get_asset(pool, job_id)
        .await?
        .ok_or_else(|| PipelineError::NotFound {
            what: format!("video asset for job {job_id}"),
        })?;

    let snapshots_dir = storage.snapshots_dir(job_id);
    let frames = extractor::extract_frames(
        ffmpeg_bin,
        std::path::Path::new(&asset.uri),
        &snapshots_dir,
        cfg.sampling_fps,
        cfg.image_format,
    )
    .await?;

    tracing::info!(
        job_id = %job_id,
        frame_count = frames.len(),
        "frames extracted, preprocessing"
    );

    // Image decode/encode is blocking work; keep it off the async runtime.
    let cfg_for_frames = cfg.clone();
    let processed = tokio::task::spawn_blocking(move || {
        frames
            .into_iter()
            .map(|frame| {
                let dims = preprocess::preprocess_frame(&frame, &cfg_for_frames)?;
                Ok((frame, dims))
            })
            .collect::<Result<Vec<_>, PipelineError>>()
    })
    .await??;

    let unreadable = processed.iter().filter(|(_, dims)| dims.is_none()).count();
    if unreadable > 0 {
        tracing::warn!(
            job_id = %job_id,
            unreadable,
            "some frames could not be decoded; recording with null dimensions"
        );
    }

    let recorded = recorder::record_snapshots(pool, job_id, &processed, cfg.sampling_fps).await?;

    tracing::info!(job_id = %job_id, snapshots = recorded, "snapshot batch committed");

    Ok(ExtractionSummary {
        frames: processed.len(),
        unreadable,
        snapshots_dir,
    })
}
