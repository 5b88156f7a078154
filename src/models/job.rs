use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle status of a video processing job.
///
/// `Extracting` is the single-flight gate: the extract endpoint only
/// transitions into it from `Uploaded`, `Extracted` or `Failed`, so two
/// concurrent extraction triggers for one job cannot both win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Created,
    Uploaded,
    Extracting,
    Extracted,
    Failed,
}

/// One video-processing run. Root of the ownership tree: asset, config,
/// snapshots and scenes all cascade-delete with the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoJob {
    pub id: Uuid,
    pub status: JobStatus,
    /// Populated when an extraction run fails; cleared on re-trigger.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
