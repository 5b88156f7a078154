use scenecut::{
    app_state::AppState,
    config::AppConfig,
    db::{self, queries},
    pipeline,
    services::{queue::JobQueue, storage::LocalStorage},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL_MS: u64 = 1000; // 1 second

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting extraction worker");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // The worker is its own process: without a recorder of its own every
    // metric it emits lands in the no-op global. Expose a scrape endpoint
    // on a separate port from the server.
    let metrics_addr: SocketAddr = config
        .worker_metrics_addr
        .parse()
        .expect("Invalid worker metrics address");
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .expect("Failed to install Prometheus metrics exporter");

    // Register worker metrics
    metrics::describe_counter!(
        "extraction_jobs_completed",
        "Total extraction runs completed"
    );
    metrics::describe_counter!("extraction_jobs_failed", "Total extraction runs that failed");
    metrics::describe_histogram!(
        "extraction_seconds",
        "Time to extract, preprocess and record one job's snapshots"
    );
    metrics::describe_gauge!(
        "extraction_queue_depth",
        "Current number of pending extraction runs in the queue"
    );

    // Initialize database
    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Initialize services
    let queue = JobQueue::new(&config.redis_url).expect("Failed to initialize job queue");
    let storage = LocalStorage::new(&config.storage_root);
    let ffmpeg_bin = config.ffmpeg_bin.clone();

    let state = AppState::new(db_pool, storage, queue, None);

    tracing::info!("Worker ready, starting extraction loop");

    loop {
        match process_next_job(&state, &ffmpeg_bin).await {
            Ok(true) => {
                tracing::debug!("Run processed, checking for next job");
            }
            Ok(false) => {
                tracing::trace!("No jobs available, sleeping");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error handling extraction run");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }
    }
}

/// Process the next extraction run from the queue.
/// Returns Ok(true) if a run was handled, Ok(false) if none was available.
///
/// No automatic retries: a failed run leaves the job `failed` with its
/// error recorded, and callers decide whether to re-trigger extraction.
async fn process_next_job(
    state: &AppState,
    ffmpeg_bin: &str,
) -> Result<bool, Box<dyn std::error::Error>> {
    let job = match state.queue.dequeue().await? {
        Some(j) => j,
        None => return Ok(false),
    };

    if let Ok(depth) = state.queue.queue_depth().await {
        metrics::gauge!("extraction_queue_depth").set(depth as f64);
    }

    tracing::info!(job_id = %job.job_id, "Processing extraction run");

    let start = std::time::Instant::now();
    match pipeline::run_extraction(&state.db, &state.storage, ffmpeg_bin, job.job_id).await {
        Ok(summary) => {
            queries::mark_extracted(&state.db, job.job_id).await?;

            metrics::counter!("extraction_jobs_completed").increment(1);
            metrics::histogram!("extraction_seconds").record(start.elapsed().as_secs_f64());

            tracing::info!(
                job_id = %job.job_id,
                frames = summary.frames,
                unreadable = summary.unreadable,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Extraction run completed"
            );
        }
        Err(e) => {
            tracing::error!(job_id = %job.job_id, error = %e, "Extraction run failed");

            queries::mark_failed(&state.db, job.job_id, &e.to_string()).await?;
            metrics::counter!("extraction_jobs_failed").increment(1);
        }
    }

    state.queue.complete(&job).await?;
    Ok(true)
}
