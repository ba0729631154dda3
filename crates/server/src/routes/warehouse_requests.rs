use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Utc;
use db::models::{
    permission::{Action, AppModule},
    technician::Technician,
    warehouse_request::{
        CreateWarehouseRequest, UpdateWarehouseRequest, WarehouseRequest, WarehouseRequestFilters,
    },
    work_order::WorkOrder,
};
use services::services::tracking::{self, WarehouseTracking};
use sqlx::SqlitePool;
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
    routes::ensure_reference,
    state::AppState,
};

const MODULE: AppModule = AppModule::SolicitudesBodega;

async fn check_links(
    pool: &SqlitePool,
    orden_id: Option<Uuid>,
    tecnico_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(orden_id) = orden_id {
        ensure_reference(WorkOrder::exists(pool, orden_id).await?, "orden_id")?;
    }
    if let Some(tecnico_id) = tecnico_id {
        ensure_reference(Technician::exists_active(pool, tecnico_id).await?, "tecnico_id")?;
    }
    Ok(())
}

pub async fn list_warehouse_requests(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<WarehouseRequestFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<WarehouseRequest>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let requests = WarehouseRequest::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(requests)))
}

pub async fn get_warehouse_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<WarehouseRequest>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let request = WarehouseRequest::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Warehouse request"))?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

/// GET /solicitudes-bodega/{id}/seguimiento
pub async fn track_warehouse_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<WarehouseTracking>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let request = WarehouseRequest::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Warehouse request"))?;
    let seguimiento = tracking::track(&request, Utc::now().date_naive());
    Ok(ResponseJson(ApiResponse::success(WarehouseTracking {
        solicitud: request,
        seguimiento,
    })))
}

pub async fn create_warehouse_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateWarehouseRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<WarehouseRequest>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;
    check_links(state.pool(), payload.orden_id, payload.tecnico_id).await?;

    let request = WarehouseRequest::create(state.pool(), &payload, Uuid::new_v4()).await?;
    info!(request_id = %request.id, cantidad = request.cantidad, "Warehouse request created");
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(
            request,
            "Warehouse request created",
        )),
    ))
}

pub async fn update_warehouse_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateWarehouseRequest>,
) -> Result<ResponseJson<ApiResponse<WarehouseRequest>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;
    check_links(state.pool(), payload.orden_id, payload.tecnico_id).await?;

    let request = WarehouseRequest::update(state.pool(), id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Warehouse request"))?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        request,
        "Warehouse request updated",
    )))
}

pub async fn delete_warehouse_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if WarehouseRequest::soft_delete(state.pool(), id).await? == 0 {
        return Err(ApiError::NotFound("Warehouse request"));
    }
    info!(request_id = %id, "Warehouse request deleted");
    Ok(ResponseJson(ApiResponse::ok_message("Warehouse request deleted")))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/solicitudes-bodega",
        Router::new()
            .route("/", get(list_warehouse_requests).post(create_warehouse_request))
            .route(
                "/{id}",
                get(get_warehouse_request)
                    .put(update_warehouse_request)
                    .delete(delete_warehouse_request),
            )
            .route("/{id}/seguimiento", get(track_warehouse_request)),
    )
}
