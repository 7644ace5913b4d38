//! Prometheus scrape endpoint.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const EXPOSITION_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Installs the process-wide Prometheus recorder.
///
/// May only succeed once per process.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// GET /metrics: every recorded counter in text exposition format.
pub async fn render(State(handle): State<PrometheusHandle>) -> Response {
    ([(CONTENT_TYPE, EXPOSITION_FORMAT)], handle.render()).into_response()
}
