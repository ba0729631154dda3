use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, patch},
};
use db::models::{
    equipment::Equipment,
    permission::{Action, AppModule},
    service_request::ServiceRequest,
    technician::Technician,
    work_order::{
        CreateWorkOrder, OrderStats, UpdateOrderStatus, UpdateWorkOrder, WorkOrder, WorkOrderFilters,
    },
};
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

const MODULE: AppModule = AppModule::Ordenes;

async fn check_assignment(
    pool: &SqlitePool,
    equipo_id: Option<Uuid>,
    tecnico_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(equipo_id) = equipo_id {
        ensure_reference(Equipment::exists(pool, equipo_id).await?, "equipo_id")?;
    }
    if let Some(tecnico_id) = tecnico_id {
        ensure_reference(Technician::exists_active(pool, tecnico_id).await?, "tecnico_id")?;
    }
    Ok(())
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<WorkOrderFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<WorkOrder>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    if let (Some(desde), Some(hasta)) = (filters.desde, filters.hasta)
        && desde > hasta
    {
        return Err(ApiError::BadRequest("desde must not be after hasta".to_string()));
    }
    let orders = WorkOrder::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(orders)))
}

pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<WorkOrder>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let order = WorkOrder::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Work order"))?;
    Ok(ResponseJson(ApiResponse::success(order)))
}

pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateWorkOrder>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<WorkOrder>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;
    let pool = state.pool();
    ensure_reference(
        ServiceRequest::exists(pool, payload.solicitud_id).await?,
        "solicitud_id",
    )?;
    check_assignment(pool, Some(payload.equipo_id), payload.tecnico_id).await?;

    let order = WorkOrder::create(pool, &payload, Uuid::new_v4()).await?;
    info!(order_id = %order.id, numero = %order.numero, "Work order created");
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(order, "Work order created")),
    ))
}

pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateWorkOrder>,
) -> Result<ResponseJson<ApiResponse<WorkOrder>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;
    check_assignment(state.pool(), payload.equipo_id, payload.tecnico_id).await?;

    let order = WorkOrder::update(state.pool(), id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Work order"))?;
    Ok(ResponseJson(ApiResponse::success_with_message(order, "Work order updated")))
}

/// PATCH /ordenes/{id}/estado
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateOrderStatus>,
) -> Result<ResponseJson<ApiResponse<WorkOrder>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    let order = WorkOrder::update_status(state.pool(), id, payload.estado)
        .await?
        .ok_or(ApiError::NotFound("Work order"))?;
    info!(order_id = %order.id, estado = %order.estado, "Work order status changed");
    Ok(ResponseJson(ApiResponse::success(order)))
}

/// GET /ordenes/estadisticas
pub async fn order_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<OrderStats>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let stats = WorkOrder::stats(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(stats)))
}

pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if WorkOrder::soft_delete(state.pool(), id).await? == 0 {
        return Err(ApiError::NotFound("Work order"));
    }
    info!(order_id = %id, "Work order deleted");
    Ok(ResponseJson(ApiResponse::ok_message("Work order deleted")))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/ordenes",
        Router::new()
            .route("/", get(list_orders).post(create_order))
            .route("/estadisticas", get(order_stats))
            .route("/{id}", get(get_order).put(update_order).delete(delete_order))
            .route("/{id}/estado", patch(update_order_status)),
    )
}
