use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    permission::{Action, AppModule},
    technician::{CreateTechnician, Technician, TechnicianFilters, UpdateTechnician},
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

const MODULE: AppModule = AppModule::Tecnicos;

pub async fn list_technicians(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<TechnicianFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<Technician>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let technicians = Technician::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(technicians)))
}

pub async fn get_technician(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Technician>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let technician = Technician::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Technician"))?;
    Ok(ResponseJson(ApiResponse::success(technician)))
}

pub async fn create_technician(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateTechnician>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Technician>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;

    let technician = Technician::create(state.pool(), &payload, Uuid::new_v4()).await?;
    info!(technician_id = %technician.id, "Technician created");
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(technician, "Technician created")),
    ))
}

/// Also reactivates a deactivated technician when `activo: true` is sent.
pub async fn update_technician(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateTechnician>,
) -> Result<ResponseJson<ApiResponse<Technician>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;

    let technician = Technician::update(state.pool(), id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Technician"))?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        technician,
        "Technician updated",
    )))
}

pub async fn delete_technician(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if Technician::deactivate(state.pool(), id).await? == 0 {
        return Err(ApiError::NotFound("Technician"));
    }
    info!(technician_id = %id, "Technician deactivated");
    Ok(ResponseJson(ApiResponse::ok_message("Technician deactivated")))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/tecnicos",
        Router::new()
            .route("/", get(list_technicians).post(create_technician))
            .route(
                "/{id}",
                get(get_technician).put(update_technician).delete(delete_technician),
            ),
    )
}
