use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
}

/// Reports 503 with the same envelope shape when the database cannot be reached.
pub async fn health(State(state): State<AppState>) -> (StatusCode, ResponseJson<ApiResponse<HealthStatus>>) {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            ResponseJson(ApiResponse::success(HealthStatus {
                status: "ok".to_string(),
                database: "up".to_string(),
            })),
        ),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ResponseJson(ApiResponse::error_with_details(
                    StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                    "Database unavailable",
                    serde_json::json!({ "status": "error", "database": "down" }),
                )),
            )
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
