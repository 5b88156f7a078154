use std::path::PathBuf;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{queries, scene_queries, snapshot_queries};
use crate::pipeline::{keyframes, segmenter};
use crate::routes::{ApiError, ApiResult};

/// Keyframes returned per scene when the caller does not ask for a count.
const DEFAULT_KEYFRAMES: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SceneDetailQuery {
    pub keyframes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SceneSummaryView {
    pub scene_id: Uuid,
    pub start_sec: f64,
    pub end_sec: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub snapshot_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SceneListResponse {
    pub job_id: Uuid,
    pub count: usize,
    pub scenes: Vec<SceneSummaryView>,
}

#[derive(Debug, Serialize)]
pub struct KeyframeView {
    pub snapshot_id: Uuid,
    pub timestamp_sec: f64,
    pub url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SceneDetailResponse {
    pub job_id: Uuid,
    pub scene_id: Uuid,
    pub start_sec: f64,
    pub end_sec: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub keyframes: Vec<KeyframeView>,
    pub keyframes_count: usize,
    pub snapshots_total: usize,
}

/// POST /api/v1/jobs/{job_id}/scenes/build — rebuild the scene set.
///
/// Idempotent for unchanged snapshots and config; prior scenes and links
/// are replaced wholesale.
pub async fn build_scenes(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let created = segmenter::build_scenes(&state.db, job_id).await?;
    metrics::counter!("scene_rebuilds_total").increment(1);

    Ok(Json(serde_json::json!({
        "job_id": job_id,
        "status": "scenes_built",
        "scenes_created": created,
    })))
}

/// GET /api/v1/jobs/{job_id}/scenes — scene list with snapshot counts.
pub async fn list_scenes(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<SceneListResponse>> {
    queries::get_job(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id}")))?;

    let scenes = scene_queries::list_with_counts(&state.db, job_id).await?;
    let views: Vec<SceneSummaryView> = scenes
        .into_iter()
        .map(|(scene, snapshot_count)| SceneSummaryView {
            scene_id: scene.id,
            start_sec: scene.start_sec,
            end_sec: scene.end_sec,
            description: scene.description,
            confidence: scene.confidence,
            snapshot_count,
        })
        .collect();

    Ok(Json(SceneListResponse {
        job_id,
        count: views.len(),
        scenes: views,
    }))
}

/// GET /api/v1/jobs/{job_id}/scenes/{scene_id} — scene detail plus up to K
/// uniformly selected keyframes.
pub async fn get_scene(
    State(state): State<AppState>,
    Path((job_id, scene_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<SceneDetailQuery>,
) -> ApiResult<Json<SceneDetailResponse>> {
    let scene = scene_queries::get_scene(&state.db, job_id, scene_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("scene {scene_id}")))?;

    let snapshots = snapshot_queries::list_for_scene(&state.db, scene_id).await?;
    let k = query
        .keyframes
        .unwrap_or(DEFAULT_KEYFRAMES as i64)
        .max(0) as usize;
    let selected = keyframes::pick_uniform(&snapshots, k);

    let views: Vec<KeyframeView> = selected
        .into_iter()
        .map(|s| KeyframeView {
            snapshot_id: s.id,
            timestamp_sec: s.timestamp_sec,
            url: state.storage.public_url(&s.uri).unwrap_or(s.uri),
            width: s.width,
            height: s.height,
        })
        .collect();

    Ok(Json(SceneDetailResponse {
        job_id,
        scene_id: scene.id,
        start_sec: scene.start_sec,
        end_sec: scene.end_sec,
        description: scene.description,
        confidence: scene.confidence,
        keyframes_count: views.len(),
        snapshots_total: snapshots.len(),
        keyframes: views,
    }))
}

/// POST /api/v1/jobs/{job_id}/scenes/{scene_id}/describe — run the
/// vision-language collaborator over the scene's keyframes and store the
/// resulting description.
pub async fn describe_scene(
    State(state): State<AppState>,
    Path((job_id, scene_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<serde_json::Value>> {
    let vlm = state
        .vlm
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("description backend not configured".to_string()))?;

    let scene = scene_queries::get_scene(&state.db, job_id, scene_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("scene {scene_id}")))?;

    let snapshots = snapshot_queries::list_for_scene(&state.db, scene_id).await?;
    let selected = keyframes::pick_uniform(&snapshots, DEFAULT_KEYFRAMES);
    let paths: Vec<PathBuf> = selected.iter().map(|s| PathBuf::from(&s.uri)).collect();

    let description = vlm
        .describe(&paths)
        .await
        .map_err(|e| ApiError::Upstream(format!("description backend: {e}")))?;

    scene_queries::set_description(&state.db, scene.id, &description.text, description.confidence)
        .await?;

    tracing::info!(job_id = %job_id, scene_id = %scene_id, "scene described");

    Ok(Json(serde_json::json!({
        "job_id": job_id,
        "scene_id": scene_id,
        "description": description.text,
        "confidence": description.confidence,
    })))
}
