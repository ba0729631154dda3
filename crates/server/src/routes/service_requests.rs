use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    client::Client,
    equipment::Equipment,
    permission::{Action, AppModule},
    service_request::{CreateServiceRequest, ServiceRequest, ServiceRequestFilters, UpdateServiceRequest},
    site::Site,
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
    routes::ensure_reference,
    state::AppState,
};

const MODULE: AppModule = AppModule::Solicitudes;

pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<ServiceRequestFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<ServiceRequest>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let requests = ServiceRequest::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(requests)))
}

pub async fn get_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<ServiceRequest>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let request = ServiceRequest::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Service request"))?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub async fn create_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateServiceRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ServiceRequest>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;
    let pool = state.pool();
    ensure_reference(Client::exists(pool, payload.cliente_id).await?, "cliente_id")?;
    ensure_reference(Site::exists(pool, payload.sede_id).await?, "sede_id")?;
    if let Some(equipo_id) = payload.equipo_id {
        ensure_reference(Equipment::exists(pool, equipo_id).await?, "equipo_id")?;
    }

    let request = ServiceRequest::create(pool, &payload, Uuid::new_v4()).await?;
    info!(
        request_id = %request.id,
        cliente_id = %request.cliente_id,
        prioridad = %request.prioridad,
        "Service request created"
    );
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(request, "Service request created")),
    ))
}

pub async fn update_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateServiceRequest>,
) -> Result<ResponseJson<ApiResponse<ServiceRequest>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;
    if let Some(equipo_id) = payload.equipo_id {
        ensure_reference(Equipment::exists(state.pool(), equipo_id).await?, "equipo_id")?;
    }

    let request = ServiceRequest::update(state.pool(), id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Service request"))?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        request,
        "Service request updated",
    )))
}

pub async fn delete_request(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if ServiceRequest::soft_delete(state.pool(), id).await? == 0 {
        return Err(ApiError::NotFound("Service request"));
    }
    info!(request_id = %id, "Service request deleted");
    Ok(ResponseJson(ApiResponse::ok_message("Service request deleted")))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/solicitudes",
        Router::new()
            .route("/", get(list_requests).post(create_request))
            .route("/{id}", get(get_request).put(update_request).delete(delete_request)),
    )
}
