use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The source video for a job. Created once at upload, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAsset {
    pub id: Uuid,
    pub job_id: Uuid,
    /// Absolute path of the uploaded file under the storage root.
    pub uri: String,
}

/// Output image format for extracted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageFormat {
    Jpg,
    Png,
    Webp,
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Jpg
    }
}

/// Sampling and preprocessing parameters for a job. 1:1 with the job,
/// set at creation and read-only during extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub id: Uuid,
    pub job_id: Uuid,
    /// Frames sampled per second of video. Must be > 0.
    pub sampling_fps: f64,
    /// Fixed scene bucket length in seconds. Must be > 0.
    pub chunk_length_sec: i32,
    /// Target frame width in pixels; falls back to a system default if unset.
    pub resize_width: Option<i32>,
    pub grayscale: bool,
    /// Binarize at a fixed threshold. Takes precedence over `grayscale`.
    pub black_white: bool,
    pub image_format: ImageFormat,
    pub created_at: DateTime<Utc>,
}

/// One sampled, preprocessed frame. `(job_id, timestamp_sec)` is unique;
/// dimensions are NULL when the frame file could not be decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub job_id: Uuid,
    pub timestamp_sec: f64,
    pub uri: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: DateTime<Utc>,
}
