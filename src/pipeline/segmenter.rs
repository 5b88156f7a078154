//! Time-chunked scene segmentation.
//!
//! Scenes are a derived view over the snapshot timeline: fixed-length,
//! half-open buckets, rebuilt wholesale on every request. The new scene set
//! is computed fully in memory and swapped in as one transaction, so there
//! is no window where scenes are deleted but not yet rebuilt.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{queries, scene_queries, snapshot_queries};
use crate::pipeline::{PipelineError, Precondition};

/// One computed scene bucket: the interval `[start_sec, end_sec)` and the
/// snapshots falling inside it, in timestamp order.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSpan {
    pub start_sec: f64,
    pub end_sec: f64,
    pub snapshot_ids: Vec<Uuid>,
}

/// Partition a timeline of `(snapshot_id, timestamp)` pairs, ascending by
/// timestamp, into fixed-length buckets. Buckets with no snapshots are
/// skipped entirely, so indices need not be contiguous, but the returned
/// intervals are always disjoint and ordered.
pub fn chunk_timeline(timeline: &[(Uuid, f64)], chunk_length_sec: i32) -> Vec<SceneSpan> {
    debug_assert!(chunk_length_sec > 0);
    let max_ts = timeline
        .iter()
        .map(|(_, ts)| *ts)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max_ts.is_finite() {
        return Vec::new();
    }

    let chunk = f64::from(chunk_length_sec);
    let num_buckets = (max_ts / chunk).floor() as i64 + 1;

    let mut spans = Vec::new();
    for i in 0..num_buckets {
        let start = i as f64 * chunk;
        let end = (i + 1) as f64 * chunk;
        let snapshot_ids: Vec<Uuid> = timeline
            .iter()
            .filter(|(_, ts)| *ts >= start && *ts < end)
            .map(|(id, _)| *id)
            .collect();
        if snapshot_ids.is_empty() {
            continue;
        }
        spans.push(SceneSpan {
            start_sec: start,
            end_sec: end,
            snapshot_ids,
        });
    }
    spans
}

/// Rebuild the scene set for a job. Idempotent: the same snapshots and
/// config always yield the same intervals, and prior scenes plus their
/// links are fully replaced, never merged.
///
/// Callers must not issue overlapping rebuilds for one job; the replace
/// transaction additionally takes a per-job advisory lock so concurrent
/// rebuilds serialize at the database rather than interleaving.
pub async fn build_scenes(pool: &PgPool, job_id: Uuid) -> Result<usize, PipelineError> {
    queries::get_job(pool, job_id)
        .await?
        .ok_or_else(|| PipelineError::NotFound {
            what: format!("job {job_id}"),
        })?;

    let cfg = queries::get_config(pool, job_id)
        .await?
        .ok_or(PipelineError::Precondition(Precondition::MissingConfig))?;
    if cfg.chunk_length_sec <= 0 {
        return Err(PipelineError::Precondition(
            Precondition::NonPositiveChunkLength,
        ));
    }

    let timeline = snapshot_queries::list_timeline(pool, job_id).await?;
    if timeline.is_empty() {
        return Err(PipelineError::Precondition(Precondition::NoSnapshots));
    }

    let spans = chunk_timeline(&timeline, cfg.chunk_length_sec);
    scene_queries::replace_scenes(pool, job_id, &spans).await?;

    tracing::info!(
        job_id = %job_id,
        scenes = spans.len(),
        snapshots = timeline.len(),
        "scene set rebuilt"
    );

    Ok(spans.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(timestamps: &[f64]) -> Vec<(Uuid, f64)> {
        timestamps.iter().map(|&ts| (Uuid::new_v4(), ts)).collect()
    }

    #[test]
    fn chunks_are_half_open_and_skip_empty_buckets() {
        // Snapshots at t = 0..=23 with 10s chunks: three scenes, the last
        // holding t = 20..23 only. floor(23 / 10) + 1 = 3, never a 4th.
        let tl = timeline(&(0..24).map(f64::from).collect::<Vec<_>>());
        let spans = chunk_timeline(&tl, 10);

        assert_eq!(spans.len(), 3);
        assert_eq!((spans[0].start_sec, spans[0].end_sec), (0.0, 10.0));
        assert_eq!((spans[1].start_sec, spans[1].end_sec), (10.0, 20.0));
        assert_eq!((spans[2].start_sec, spans[2].end_sec), (20.0, 30.0));
        assert_eq!(spans[0].snapshot_ids.len(), 10);
        assert_eq!(spans[1].snapshot_ids.len(), 10);
        assert_eq!(spans[2].snapshot_ids.len(), 4);
    }

    #[test]
    fn boundary_snapshot_lands_in_the_next_bucket() {
        let tl = timeline(&[9.5, 10.0]);
        let spans = chunk_timeline(&tl, 10);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].snapshot_ids, vec![tl[0].0]);
        assert_eq!(spans[1].snapshot_ids, vec![tl[1].0]);
    }

    #[test]
    fn sparse_timeline_skips_middle_buckets() {
        let tl = timeline(&[1.0, 35.0]);
        let spans = chunk_timeline(&tl, 10);

        // Buckets [10,20) and [20,30) hold nothing and are absent.
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start_sec, spans[0].end_sec), (0.0, 10.0));
        assert_eq!((spans[1].start_sec, spans[1].end_sec), (30.0, 40.0));
    }

    #[test]
    fn intervals_are_disjoint_and_ordered() {
        let tl = timeline(&[0.0, 3.3, 7.1, 12.9, 44.0, 45.5, 101.0]);
        let spans = chunk_timeline(&tl, 7);

        for pair in spans.windows(2) {
            assert!(pair[0].end_sec <= pair[1].start_sec);
            assert!(pair[0].start_sec < pair[0].end_sec);
        }
        let assigned: usize = spans.iter().map(|s| s.snapshot_ids.len()).sum();
        assert_eq!(assigned, tl.len());
    }

    #[test]
    fn rebuild_from_same_input_is_identical() {
        let tl = timeline(&[0.5, 4.0, 11.0, 19.9, 20.0]);
        assert_eq!(chunk_timeline(&tl, 10), chunk_timeline(&tl, 10));
    }

    #[test]
    fn single_snapshot_yields_single_scene() {
        let tl = timeline(&[0.0]);
        let spans = chunk_timeline(&tl, 10);
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start_sec, spans[0].end_sec), (0.0, 10.0));
    }

    #[test]
    fn empty_timeline_yields_no_scenes() {
        assert!(chunk_timeline(&[], 10).is_empty());
    }
}
