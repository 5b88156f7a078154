use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::queries::{self, NewJobParams};
use crate::db::snapshot_queries;
use crate::models::snapshot::{ImageFormat, SnapshotConfig};
use crate::routes::{ApiError, ApiResult};
use crate::services::queue::QueuedExtraction;

fn default_sampling_fps() -> f64 {
    1.0
}

fn default_chunk_length() -> i32 {
    10
}

fn positive(value: &f64, _ctx: &()) -> garde::Result {
    if *value > 0.0 {
        Ok(())
    } else {
        Err(garde::Error::new("must be greater than zero"))
    }
}

/// POST /api/v1/jobs request body. Sampling and preprocessing parameters
/// are fixed at creation; extraction reads them as-is.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobRequest {
    #[serde(default = "default_sampling_fps")]
    #[garde(custom(positive))]
    pub sampling_fps: f64,

    #[serde(default = "default_chunk_length")]
    #[garde(range(min = 1))]
    pub chunk_length_sec: i32,

    #[garde(inner(range(min = 16, max = 4096)))]
    pub resize_width: Option<i32>,

    #[serde(default)]
    #[garde(skip)]
    pub grayscale: bool,

    #[serde(default)]
    #[garde(skip)]
    pub black_white: bool,

    #[serde(default)]
    #[garde(skip)]
    pub image_format: ImageFormat,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: Uuid,
    pub status: String,
    pub config: SnapshotConfig,
}

#[derive(Debug, Serialize)]
pub struct SnapshotView {
    pub snapshot_id: Uuid,
    pub timestamp_sec: f64,
    pub url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotListResponse {
    pub job_id: Uuid,
    pub count: usize,
    pub snapshots: Vec<SnapshotView>,
}

/// POST /api/v1/jobs — create a job with its snapshot config.
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<CreateJobResponse>)> {
    req.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let params = NewJobParams {
        sampling_fps: req.sampling_fps,
        chunk_length_sec: req.chunk_length_sec,
        resize_width: req.resize_width,
        grayscale: req.grayscale,
        black_white: req.black_white,
        image_format: req.image_format,
    };
    let (job, config) = queries::create_job(&state.db, &params).await?;

    tracing::info!(job_id = %job.id, sampling_fps = config.sampling_fps, "job created");

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            job_id: job.id,
            status: job.status.to_string(),
            config,
        }),
    ))
}

/// GET /api/v1/jobs/{job_id} — job status, the poll target for extraction.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<JobResponse>> {
    let job = queries::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;

    Ok(Json(JobResponse {
        job_id: job.id,
        status: job.status.to_string(),
        error: job.error,
        created_at: job.created_at,
    }))
}

/// DELETE /api/v1/jobs/{job_id} — drop the job, its rows and its files.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = queries::delete_job(&state.db, job_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("job {job_id}")));
    }

    if let Err(e) = state.storage.remove_job(job_id).await {
        // Rows are gone; orphaned files are an operational cleanup concern.
        tracing::warn!(job_id = %job_id, error = %e, "failed to remove job storage");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/{job_id}/video — multipart video upload.
pub async fn upload_video(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<JobResponse>> {
    let job = queries::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("video") {
            let file_name = field.file_name().unwrap_or("video.mp4").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
            upload = Some((file_name, data.to_vec()));
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::BadRequest("missing 'video' field".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("empty video upload".to_string()));
    }

    let path = state
        .storage
        .save_video(job_id, &file_name, &data)
        .await
        .map_err(|e| ApiError::Pipeline(e.into()))?;

    let uri = path.display().to_string();
    let asset = queries::attach_video(&state.db, job_id, &uri).await?;
    if asset.is_none() {
        return Err(ApiError::Conflict(format!(
            "job {job_id} already has a video (status: {})",
            job.status
        )));
    }

    tracing::info!(job_id = %job_id, bytes = data.len(), uri = %uri, "video uploaded");

    Ok(Json(JobResponse {
        job_id,
        status: "uploaded".to_string(),
        error: None,
        created_at: job.created_at,
    }))
}

/// POST /api/v1/jobs/{job_id}/extract — queue an extraction run.
///
/// The status check-and-set makes this single-flight per job: a second
/// trigger while one run is in flight gets 409.
pub async fn trigger_extract(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let job = queries::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;

    if queries::get_asset(&state.db, job_id).await?.is_none() {
        return Err(ApiError::BadRequest(
            "job has no uploaded video; upload one first".to_string(),
        ));
    }

    if !queries::try_begin_extraction(&state.db, job_id).await? {
        return Err(ApiError::Conflict(format!(
            "extraction already in flight for job {job_id} (status: {})",
            job.status
        )));
    }

    if let Err(e) = state.queue.enqueue(&QueuedExtraction { job_id }).await {
        queries::mark_failed(&state.db, job_id, "failed to enqueue extraction").await?;
        tracing::error!(job_id = %job_id, error = %e, "failed to enqueue extraction");
        return Err(ApiError::Unavailable("job queue unavailable".to_string()));
    }

    metrics::counter!("extraction_jobs_total").increment(1);
    tracing::info!(job_id = %job_id, "extraction queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "job_id": job_id, "status": "extraction_started" })),
    ))
}

/// GET /api/v1/jobs/{job_id}/snapshots — ordered snapshot timeline.
pub async fn list_snapshots(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<SnapshotListResponse>> {
    queries::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;

    let snapshots = snapshot_queries::list_for_job(&state.db, job_id).await?;
    let views: Vec<SnapshotView> = snapshots
        .into_iter()
        .map(|s| SnapshotView {
            snapshot_id: s.id,
            timestamp_sec: s.timestamp_sec,
            url: state.storage.public_url(&s.uri).unwrap_or(s.uri),
            width: s.width,
            height: s.height,
        })
        .collect();

    Ok(Json(SnapshotListResponse {
        job_id,
        count: views.len(),
        snapshots: views,
    }))
}
