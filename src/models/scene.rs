use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder description assigned to every scene at build time, replaced
/// later by the vision-language collaborator.
pub const PENDING_DESCRIPTION: &str = "(pending)";

/// A contiguous half-open time bucket `[start_sec, end_sec)` of a job's
/// snapshot timeline. Scenes are a derived view: rebuilt wholesale from the
/// snapshots and config, never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub id: Uuid,
    pub job_id: Uuid,
    pub start_sec: f64,
    pub end_sec: f64,
    pub description: String,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Link between a scene and a snapshot falling inside its interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub scene_id: Uuid,
    pub snapshot_id: Uuid,
    pub evidence: Option<String>,
    pub score: Option<f64>,
}
