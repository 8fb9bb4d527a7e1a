use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::forecasting::HistoryImportError;
use crate::workflows::inspection::InspectionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failures surfaced by the service binary and the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("history import error: {0}")]
    History(#[from] HistoryImportError),
    #[error("inspection error: {0}")]
    Inspection(#[from] InspectionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::History(_) => StatusCode::BAD_REQUEST,
            AppError::Inspection(err) => err.status_code(),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
