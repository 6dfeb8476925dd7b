use axum::http::StatusCode;

pub async fn health_check() -> StatusCode {
    tracing::trace!("Health check request received.");
    StatusCode::OK
}
