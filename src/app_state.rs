use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{queue::JobQueue, storage::LocalStorage, vlm::SceneDescriber};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub storage: Arc<LocalStorage>,
    pub queue: Arc<JobQueue>,
    /// Absent when no description backend is configured; the describe
    /// endpoint answers 503 in that case.
    pub vlm: Option<Arc<SceneDescriber>>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        storage: LocalStorage,
        queue: JobQueue,
        vlm: Option<SceneDescriber>,
    ) -> Self {
        Self {
            db,
            storage: Arc::new(storage),
            queue: Arc::new(queue),
            vlm: vlm.map(Arc::new),
        }
    }
}
