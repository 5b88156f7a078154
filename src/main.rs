mod app_state;
mod config;
mod db;
mod models;
mod pipeline;
mod routes;
mod services;

use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{queue::JobQueue, storage::LocalStorage, vlm::SceneDescriber};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing scenecut server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register server-side metrics; the worker registers its own set
    // against its own recorder.
    metrics::describe_counter!("extraction_jobs_total", "Total extraction runs submitted");
    metrics::describe_counter!("scene_rebuilds_total", "Total scene set rebuilds");

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize Redis job queue
    tracing::info!("Connecting to Redis job queue");
    let queue = JobQueue::new(&config.redis_url).expect("Failed to initialize job queue");

    // Local storage for uploaded videos and extracted frames
    let storage = LocalStorage::new(&config.storage_root);

    // Optional vision-language description backend
    let vlm = config.vlm_endpoint.as_ref().map(|endpoint| {
        tracing::info!(endpoint = %endpoint, model = %config.vlm_model, "Description backend configured");
        SceneDescriber::new(
            endpoint.clone(),
            config.vlm_api_token.clone(),
            config.vlm_model.clone(),
        )
    });

    // Create shared application state
    let state = AppState::new(db_pool, storage, queue, vlm);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/jobs", post(routes::jobs::create_job))
        .route(
            "/api/v1/jobs/{job_id}",
            get(routes::jobs::get_job).delete(routes::jobs::delete_job),
        )
        .route("/api/v1/jobs/{job_id}/video", post(routes::jobs::upload_video))
        .route(
            "/api/v1/jobs/{job_id}/extract",
            post(routes::jobs::trigger_extract),
        )
        .route(
            "/api/v1/jobs/{job_id}/snapshots",
            get(routes::jobs::list_snapshots),
        )
        .route(
            "/api/v1/jobs/{job_id}/scenes/build",
            post(routes::scenes::build_scenes),
        )
        .route("/api/v1/jobs/{job_id}/scenes", get(routes::scenes::list_scenes))
        .route(
            "/api/v1/jobs/{job_id}/scenes/{scene_id}",
            get(routes::scenes::get_scene),
        )
        .route(
            "/api/v1/jobs/{job_id}/scenes/{scene_id}/describe",
            post(routes::scenes::describe_scene),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::render_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        // Raise both limits in step: axum's extractor limit and the
        // tower-http byte cap both apply to multipart video uploads.
        .layer(DefaultBodyLimit::max(512 * 1024 * 1024))
        .layer(RequestBodyLimitLayer::new(512 * 1024 * 1024)); // 512 MB video uploads

    tracing::info!("Starting scenecut on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
