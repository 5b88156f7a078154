//! Snapshot queries: atomic batch insert and ordered timeline reads.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::snapshot::Snapshot;

/// Row values for one snapshot in an extraction batch.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
    pub timestamp_sec: f64,
    pub uri: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

fn snapshot_from_row(row: &PgRow) -> Result<Snapshot, sqlx::Error> {
    Ok(Snapshot {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        timestamp_sec: row.try_get("timestamp_sec")?,
        uri: row.try_get("uri")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert all snapshots for one extraction run in a single transaction:
/// either every row commits or none do. A unique-constraint violation on
/// `(job_id, timestamp_sec)` rolls the whole batch back.
pub async fn insert_batch(
    pool: &PgPool,
    job_id: Uuid,
    rows: &[NewSnapshot],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO snapshots (job_id, timestamp_sec, uri, width, height)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(job_id)
        .bind(row.timestamp_sec)
        .bind(&row.uri)
        .bind(row.width)
        .bind(row.height)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(rows.len() as u64)
}

/// All snapshots for a job, ascending by timestamp.
pub async fn list_for_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<Snapshot>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, job_id, timestamp_sec, uri, width, height, created_at
        FROM snapshots
        WHERE job_id = $1
        ORDER BY timestamp_sec ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(snapshot_from_row).collect()
}

/// The `(id, timestamp)` timeline for a job, ascending by timestamp.
/// Lightweight input for the segmenter.
pub async fn list_timeline(pool: &PgPool, job_id: Uuid) -> Result<Vec<(Uuid, f64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, timestamp_sec
        FROM snapshots
        WHERE job_id = $1
        ORDER BY timestamp_sec ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|r| Ok((r.try_get("id")?, r.try_get("timestamp_sec")?)))
        .collect()
}

/// Snapshots linked to a scene, ascending by timestamp. Ordering here feeds
/// keyframe selection and must stay timestamp-based.
pub async fn list_for_scene(pool: &PgPool, scene_id: Uuid) -> Result<Vec<Snapshot>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.job_id, s.timestamp_sec, s.uri, s.width, s.height, s.created_at
        FROM snapshots s
        JOIN scene_snapshots ss ON ss.snapshot_id = s.id
        WHERE ss.scene_id = $1
        ORDER BY s.timestamp_sec ASC
        "#,
    )
    .bind(scene_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(snapshot_from_row).collect()
}
