use axum::{Router, extract::State, response::Json as ResponseJson, routing::{get, post}};
use db::models::user::User;
use serde::{Deserialize, Serialize};
use services::services::auth::{LoginResponse, RefreshResponse};
use ts_rs::TS;
use utils::response::ApiResponse;
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiJson, AuthUser},
    state::AppState,
};

#[derive(Debug, Deserialize, Serialize, Validate, TS)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, TS)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    payload.validate()?;
    let session = state.auth.login(&payload.email, &payload.password).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(session, "Login successful")))
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<ResponseJson<ApiResponse<RefreshResponse>>, ApiError> {
    payload.validate()?;
    let refreshed = state.auth.refresh(&payload.refresh_token).await?;
    Ok(ResponseJson(ApiResponse::success(refreshed)))
}

/// Revokes the session behind the presented access token.
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.auth.logout(user.0.session_id).await?;
    Ok(ResponseJson(ApiResponse::ok_message("Logged out")))
}

pub async fn me(user: AuthUser) -> ResponseJson<ApiResponse<User>> {
    ResponseJson(ApiResponse::success(user.0.user))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/login", post(login))
            .route("/refresh", post(refresh))
            .route("/logout", post(logout))
            .route("/me", get(me)),
    )
}
