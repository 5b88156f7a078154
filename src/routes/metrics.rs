use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// GET /metrics — snapshot of the server's metric registry in Prometheus
/// text exposition format. The worker exposes its own registry on a
/// separate listener.
pub async fn render_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    handle.render()
}
