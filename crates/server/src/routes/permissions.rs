use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    permission::{
        Action, AppModule, CreatePermission, Permission, PermissionFilters, UpdatePermission,
    },
    user::UserRole,
};
use services::services::permissions::{self, ModuleAccess};
use tracing::info;
use utils::{
    pagination::{Page, PageRequest},
    response::ApiResponse,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery, AuthUser},
    state::AppState,
};

const MODULE: AppModule = AppModule::Permisos;

pub async fn list_permissions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<PermissionFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<Permission>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let permissions = Permission::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(permissions)))
}

pub async fn get_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Permission>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let permission = Permission::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Permission"))?;
    Ok(ResponseJson(ApiResponse::success(permission)))
}

/// GET /permisos/rol/{rol}: effective access of a role on every module.
pub async fn role_matrix(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(rol): ApiPath<UserRole>,
) -> Result<ResponseJson<ApiResponse<Vec<ModuleAccess>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let matrix = permissions::access_matrix(state.pool(), rol).await?;
    Ok(ResponseJson(ApiResponse::success(matrix)))
}

/// GET /permisos/mios: the caller's own matrix, readable by every role.
pub async fn own_matrix(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<ModuleAccess>>>, ApiError> {
    let matrix = permissions::access_matrix(state.pool(), user.0.rol()).await?;
    Ok(ResponseJson(ApiResponse::success(matrix)))
}

pub async fn create_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreatePermission>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Permission>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    if payload.rol == UserRole::Admin {
        return Err(ApiError::BadRequest(
            "admin permissions are implicit and cannot be stored".to_string(),
        ));
    }

    let permission = Permission::create(state.pool(), &payload, Uuid::new_v4()).await?;
    info!(
        permission_id = %permission.id,
        rol = %permission.rol,
        modulo = %permission.modulo,
        "Permission created"
    );
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(permission, "Permission created")),
    ))
}

pub async fn update_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePermission>,
) -> Result<ResponseJson<ApiResponse<Permission>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }

    let permission = Permission::update(state.pool(), id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Permission"))?;
    info!(permission_id = %permission.id, "Permission updated");
    Ok(ResponseJson(ApiResponse::success_with_message(
        permission,
        "Permission updated",
    )))
}

/// Permission rows are removed outright; a missing row simply grants nothing.
pub async fn delete_permission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if Permission::delete(state.pool(), id).await? == 0 {
        return Err(ApiError::NotFound("Permission"));
    }
    info!(permission_id = %id, "Permission deleted");
    Ok(ResponseJson(ApiResponse::ok_message("Permission deleted")))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/permisos",
        Router::new()
            .route("/", get(list_permissions).post(create_permission))
            .route("/mios", get(own_matrix))
            .route("/rol/{rol}", get(role_matrix))
            .route(
                "/{id}",
                get(get_permission)
                    .put(update_permission)
                    .delete(delete_permission),
            ),
    )
}
