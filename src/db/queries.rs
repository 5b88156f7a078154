//! Job, asset and config queries.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::job::{JobStatus, VideoJob};
use crate::models::snapshot::{ImageFormat, SnapshotConfig, VideoAsset};

/// Parameters for a new job's snapshot config.
#[derive(Debug, Clone)]
pub struct NewJobParams {
    pub sampling_fps: f64,
    pub chunk_length_sec: i32,
    pub resize_width: Option<i32>,
    pub grayscale: bool,
    pub black_white: bool,
    pub image_format: ImageFormat,
}

fn job_from_row(row: &PgRow) -> Result<VideoJob, sqlx::Error> {
    let status_str: String = row.try_get("status")?;
    Ok(VideoJob {
        id: row.try_get("id")?,
        status: status_str.parse().unwrap_or(JobStatus::Created),
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
    })
}

fn config_from_row(row: &PgRow) -> Result<SnapshotConfig, sqlx::Error> {
    let format_str: String = row.try_get("image_format")?;
    Ok(SnapshotConfig {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        sampling_fps: row.try_get("sampling_fps")?,
        chunk_length_sec: row.try_get("chunk_length_sec")?,
        resize_width: row.try_get("resize_width")?,
        grayscale: row.try_get("grayscale")?,
        black_white: row.try_get("black_white")?,
        image_format: format_str.parse().unwrap_or(ImageFormat::Jpg),
        created_at: row.try_get("created_at")?,
    })
}

/// Create a job together with its 1:1 snapshot config, atomically.
pub async fn create_job(
    pool: &PgPool,
    params: &NewJobParams,
) -> Result<(VideoJob, SnapshotConfig), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let job_row = sqlx::query(
        r#"
        INSERT INTO video_jobs (status)
        VALUES ('created')
        RETURNING id, status, error, created_at
        "#,
    )
    .fetch_one(&mut *tx)
    .await?;
    let job = job_from_row(&job_row)?;

    let cfg_row = sqlx::query(
        r#"
        INSERT INTO snapshot_configs
            (job_id, sampling_fps, chunk_length_sec, resize_width, grayscale, black_white, image_format)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, job_id, sampling_fps, chunk_length_sec, resize_width,
                  grayscale, black_white, image_format, created_at
        "#,
    )
    .bind(job.id)
    .bind(params.sampling_fps)
    .bind(params.chunk_length_sec)
    .bind(params.resize_width)
    .bind(params.grayscale)
    .bind(params.black_white)
    .bind(params.image_format.to_string())
    .fetch_one(&mut *tx)
    .await?;
    let config = config_from_row(&cfg_row)?;

    tx.commit().await?;
    Ok((job, config))
}

/// Get a job by ID
pub async fn get_job(pool: &PgPool, job_id: Uuid) -> Result<Option<VideoJob>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, status, error, created_at
        FROM video_jobs
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// Delete a job; all owned rows cascade. Returns false if it did not exist.
pub async fn delete_job(pool: &PgPool, job_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM video_jobs WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Attach the uploaded video to a job, moving it `created -> uploaded`.
///
/// Returns `None` when the job is not in `created` (already has a video or
/// is mid-extraction); the asset is immutable once created.
pub async fn attach_video(
    pool: &PgPool,
    job_id: Uuid,
    uri: &str,
) -> Result<Option<VideoAsset>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE video_jobs
        SET status = 'uploaded'
        WHERE id = $1 AND status = 'created'
        "#,
    )
    .bind(job_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query(
        r#"
        INSERT INTO video_assets (job_id, uri)
        VALUES ($1, $2)
        RETURNING id, job_id, uri
        "#,
    )
    .bind(job_id)
    .bind(uri)
    .fetch_one(&mut *tx)
    .await?;

    let asset = VideoAsset {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        uri: row.try_get("uri")?,
    };

    tx.commit().await?;
    Ok(Some(asset))
}

/// Get the video asset for a job
pub async fn get_asset(pool: &PgPool, job_id: Uuid) -> Result<Option<VideoAsset>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, job_id, uri
        FROM video_assets
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    Ok(match row {
        Some(r) => Some(VideoAsset {
            id: r.try_get("id")?,
            job_id: r.try_get("job_id")?,
            uri: r.try_get("uri")?,
        }),
        None => None,
    })
}

/// Get the snapshot config for a job
pub async fn get_config(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Option<SnapshotConfig>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, job_id, sampling_fps, chunk_length_sec, resize_width,
               grayscale, black_white, image_format, created_at
        FROM snapshot_configs
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(config_from_row).transpose()
}

/// Check-and-set gate for single-flight extraction: moves the job into
/// `extracting` only from a quiescent status. Returns false when another
/// extraction already holds the job or the job has no uploaded video yet.
pub async fn try_begin_extraction(pool: &PgPool, job_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE video_jobs
        SET status = 'extracting', error = NULL
        WHERE id = $1 AND status IN ('uploaded', 'extracted', 'failed')
        "#,
    )
    .bind(job_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Mark an extraction run as complete.
pub async fn mark_extracted(pool: &PgPool, job_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE video_jobs SET status = 'extracted', error = NULL WHERE id = $1")
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark an extraction run as failed, recording the error for callers to poll.
pub async fn mark_failed(pool: &PgPool, job_id: Uuid, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE video_jobs SET status = 'failed', error = $2 WHERE id = $1")
        .bind(job_id)
        .bind(error)
        .execute(pool)
        .await?;
    Ok(())
}
