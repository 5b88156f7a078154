//! Scene queries: generation-style replace plus reads for the API surface.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::scene::{Scene, PENDING_DESCRIPTION};
use crate::pipeline::segmenter::SceneSpan;

fn scene_from_row(row: &PgRow) -> Result<Scene, sqlx::Error> {
    Ok(Scene {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        start_sec: row.try_get("start_sec")?,
        end_sec: row.try_get("end_sec")?,
        description: row.try_get("description")?,
        confidence: row.try_get("confidence")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Advisory lock key for a job, taken from the leading bytes of its UUID.
/// Serializes concurrent scene rebuilds for the same job at the database.
fn advisory_key(job_id: Uuid) -> i64 {
    let b = job_id.as_bytes();
    i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}

/// Swap in a freshly computed scene set for a job as one transaction:
/// take the per-job advisory lock, delete the old scenes (links cascade),
/// insert the new scenes and their snapshot links. There is never a window
/// where the old set is gone but the new one is absent.
pub async fn replace_scenes(
    pool: &PgPool,
    job_id: Uuid,
    spans: &[SceneSpan],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(advisory_key(job_id))
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM scenes WHERE job_id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    for span in spans {
        let scene_row = sqlx::query(
            r#"
            INSERT INTO scenes (job_id, start_sec, end_sec, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(job_id)
        .bind(span.start_sec)
        .bind(span.end_sec)
        .bind(PENDING_DESCRIPTION)
        .fetch_one(&mut *tx)
        .await?;
        let scene_id: Uuid = scene_row.try_get("id")?;

        for snapshot_id in &span.snapshot_ids {
            sqlx::query(
                r#"
                INSERT INTO scene_snapshots (scene_id, snapshot_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(scene_id)
            .bind(snapshot_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await
}

/// Scenes for a job with their snapshot counts, ordered by start time.
pub async fn list_with_counts(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Vec<(Scene, i64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT sc.id, sc.job_id, sc.start_sec, sc.end_sec, sc.description,
               sc.confidence, sc.created_at,
               COUNT(ss.snapshot_id) AS snapshot_count
        FROM scenes sc
        LEFT JOIN scene_snapshots ss ON ss.scene_id = sc.id
        WHERE sc.job_id = $1
        GROUP BY sc.id
        ORDER BY sc.start_sec ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|r| Ok((scene_from_row(r)?, r.try_get("snapshot_count")?)))
        .collect()
}

/// Get one scene, scoped to its job.
pub async fn get_scene(
    pool: &PgPool,
    job_id: Uuid,
    scene_id: Uuid,
) -> Result<Option<Scene>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, job_id, start_sec, end_sec, description, confidence, created_at
        FROM scenes
        WHERE id = $1 AND job_id = $2
        "#,
    )
    .bind(scene_id)
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(scene_from_row).transpose()
}

/// Store the description produced by the vision-language collaborator.
pub async fn set_description(
    pool: &PgPool,
    scene_id: Uuid,
    description: &str,
    confidence: Option<f64>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE scenes
        SET description = $2, confidence = $3
        WHERE id = $1
        "#,
    )
    .bind(scene_id)
    .bind(description)
    .bind(confidence)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}
