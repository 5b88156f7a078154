use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string for the extraction queue
    pub redis_url: String,

    /// Root directory for uploaded videos and extracted frames
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,

    /// ffmpeg binary to invoke for frame extraction
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    /// Bind address for the worker's Prometheus exporter. The worker runs
    /// its own recorder; the server exposes /metrics itself.
    #[serde(default = "default_worker_metrics_addr")]
    pub worker_metrics_addr: String,

    /// OpenAI-compatible vision endpoint for scene descriptions (optional)
    pub vlm_endpoint: Option<String>,

    /// Bearer token for the vision endpoint
    pub vlm_api_token: Option<String>,

    /// Model name sent to the vision endpoint
    #[serde(default = "default_vlm_model")]
    pub vlm_model: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_worker_metrics_addr() -> String {
    "0.0.0.0:9464".to_string()
}

fn default_vlm_model() -> String {
    "Qwen/Qwen2.5-VL-7B-Instruct".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    #[test]
    fn default_worker_metrics_addr_is_a_valid_socket_addr() {
        let addr: Result<SocketAddr, _> = default_worker_metrics_addr().parse();
        assert!(addr.is_ok());
    }

    #[test]
    fn default_bind_addr_is_a_valid_socket_addr() {
        let addr: Result<SocketAddr, _> = default_bind_addr().parse();
        assert!(addr.is_ok());
    }
}
