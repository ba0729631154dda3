use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::services::auth::AuthError;
use thiserror::Error;
use tracing::{error, warn};
use utils::response::ApiResponse;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("no fields to update")]
    EmptyUpdate,
    #[error("{0}")]
    BadRequest(String),
    #[error("{field} does not reference an existing record")]
    InvalidReference { field: &'static str },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("insufficient permissions")]
    Forbidden,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::EmptyUpdate
            | ApiError::BadRequest(_)
            | ApiError::InvalidReference { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Auth(e) => match e {
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::SessionExpired
                | AuthError::InactiveUser => StatusCode::UNAUTHORIZED,
                AuthError::Database(e) => database_status(e),
                AuthError::Hashing(_) | AuthError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(e) => database_status(e),
        }
    }

    /// Message shown to the caller. Infrastructure failures are reported generically.
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::SERVICE_UNAVAILABLE => "Database unavailable".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => match self {
                ApiError::Validation(_) => "Validation failed".to_string(),
                ApiError::Database(e) if is_unique_violation(e) => "Record already exists".to_string(),
                ApiError::Database(e) if is_foreign_key_violation(e) => {
                    "Referenced record does not exist".to_string()
                }
                other => other.to_string(),
            },
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn database_status(e: &sqlx::Error) -> StatusCode {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        e if is_unique_violation(e) => StatusCode::CONFLICT,
        e if is_foreign_key_violation(e) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let message = self.public_message();
        let body = match &self {
            ApiError::Validation(errors) => ApiResponse::<()>::error_with_details(
                status.as_u16(),
                message,
                serde_json::to_value(errors).unwrap_or_default(),
            ),
            ApiError::InvalidReference { field } => ApiResponse::<()>::error_with_details(
                status.as_u16(),
                message,
                serde_json::json!({ "field": field }),
            ),
            _ => ApiResponse::<()>::error(status.as_u16(), message),
        };
        (status, ResponseJson(body)).into_response()
    }
}
