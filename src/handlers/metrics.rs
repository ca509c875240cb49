use axum::{http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use tracing::error;

use crate::error::ErrorBody;

// GET /metrics - prometheus text format
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "failed to encode metrics");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(ErrorBody::new("Internal server error")),
        ));
    }

    Ok((
        [("content-type", encoder.format_type().to_string())],
        buffer,
    ))
}
