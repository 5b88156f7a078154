//! Snapshot recording: timestamp derivation and atomic batch persistence.

use std::path::PathBuf;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::snapshot_queries::{self, NewSnapshot};
use crate::pipeline::PipelineError;

/// Timestamp of a frame at zero-based `index` in the sorted sequence.
/// Position in the sequence is authoritative, not any number embedded in
/// the filename.
pub fn frame_timestamp(index: usize, sampling_fps: f64) -> f64 {
    index as f64 / sampling_fps
}

/// Persist one snapshot row per preprocessed frame, all inside a single
/// transaction: either the whole run is visible or none of it is.
///
/// Unreadable frames (`None` dimensions) are still recorded so that frame
/// indexing stays contiguous. Timestamp uniqueness per job is enforced by
/// the `uq_snapshot_job_timestamp` constraint as a defensive check; it
/// cannot trip under monotonic indexing with a fixed positive rate.
pub async fn record_snapshots(
    pool: &PgPool,
    job_id: Uuid,
    frames: &[(PathBuf, Option<(u32, u32)>)],
    sampling_fps: f64,
) -> Result<u64, PipelineError> {
    let rows: Vec<NewSnapshot> = frames
        .iter()
        .enumerate()
        .map(|(index, (path, dims))| NewSnapshot {
            timestamp_sec: frame_timestamp(index, sampling_fps),
            uri: path.display().to_string(),
            width: dims.map(|(w, _)| w as i32),
            height: dims.map(|(_, h)| h as i32),
        })
        .collect();

    let inserted = snapshot_queries::insert_batch(pool, job_id, &rows).await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_index_over_rate() {
        assert_eq!(frame_timestamp(0, 2.0), 0.0);
        assert_eq!(frame_timestamp(1, 2.0), 0.5);
        assert_eq!(frame_timestamp(3, 2.0), 1.5);
        assert_eq!(frame_timestamp(7, 1.0), 7.0);
    }

    #[test]
    fn timestamps_strictly_increase_with_index() {
        let rates = [0.25, 0.5, 1.0, 2.5, 30.0];
        for rate in rates {
            let mut prev = f64::NEG_INFINITY;
            for i in 0..100 {
                let ts = frame_timestamp(i, rate);
                assert!(ts > prev, "rate {rate}, index {i}");
                prev = ts;
            }
        }
    }
}
