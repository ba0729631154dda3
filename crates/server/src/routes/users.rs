use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    permission::{Action, AppModule},
    user::{CreateUserRequest, UpdateUserRequest, User, UserFilters},
};
use tracing::info;
use utils::{
    pagination::{Page, PageRequest},
    response::ApiResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery, AuthUser},
    state::AppState,
};

const MODULE: AppModule = AppModule::Usuarios;

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<UserFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<User>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let users = User::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

/// Deactivated users stay readable so they can be reactivated.
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let found = User::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(ResponseJson(ApiResponse::success(found)))
}

pub async fn create_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;

    let created = state.auth.create_user(&payload).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(created, "User created")),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;
    if id == user.0.id() && (payload.activo == Some(false) || payload.rol.is_some()) {
        return Err(ApiError::BadRequest(
            "Cannot change your own role or deactivate yourself".to_string(),
        ));
    }

    let updated = state
        .auth
        .update_user(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    info!(user_id = %id, "User updated");
    Ok(ResponseJson(ApiResponse::success_with_message(updated, "User updated")))
}

pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if id == user.0.id() {
        return Err(ApiError::BadRequest("Cannot deactivate yourself".to_string()));
    }
    if !state.auth.deactivate_user(id).await? {
        return Err(ApiError::NotFound("User"));
    }
    Ok(ResponseJson(ApiResponse::ok_message("User deactivated")))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/usuarios",
        Router::new()
            .route("/", get(list_users).post(create_user))
            .route("/{id}", get(get_user).put(update_user).delete(delete_user)),
    )
}
