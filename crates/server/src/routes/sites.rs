use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    client::Client,
    equipment::{Equipment, EquipmentFilters},
    permission::{Action, AppModule},
    site::{CreateSite, Site, SiteFilters, UpdateSite},
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

const MODULE: AppModule = AppModule::Sedes;

pub async fn list_sites(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<SiteFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<Site>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let sites = Site::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(sites)))
}

pub async fn get_site(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Site>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let site = Site::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Site"))?;
    Ok(ResponseJson(ApiResponse::success(site)))
}

pub async fn create_site(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateSite>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Site>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;
    ensure_reference(Client::exists(state.pool(), payload.cliente_id).await?, "cliente_id")?;

    let site = Site::create(state.pool(), &payload, Uuid::new_v4()).await?;
    info!(site_id = %site.id, cliente_id = %site.cliente_id, "Site created");
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(site, "Site created")),
    ))
}

pub async fn update_site(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateSite>,
) -> Result<ResponseJson<ApiResponse<Site>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;
    if let Some(cliente_id) = payload.cliente_id {
        ensure_reference(Client::exists(state.pool(), cliente_id).await?, "cliente_id")?;
    }

    let site = Site::update(state.pool(), id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Site"))?;
    Ok(ResponseJson(ApiResponse::success_with_message(site, "Site updated")))
}

pub async fn delete_site(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if Site::soft_delete(state.pool(), id).await? == 0 {
        return Err(ApiError::NotFound("Site"));
    }
    info!(site_id = %id, "Site deleted");
    Ok(ResponseJson(ApiResponse::ok_message("Site deleted")))
}

/// GET /sedes/{id}/equipos
pub async fn list_site_equipment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<Equipment>>>, ApiError> {
    user.require(&state, AppModule::Equipos, Action::Ver).await?;
    if !Site::exists(state.pool(), id).await? {
        return Err(ApiError::NotFound("Site"));
    }
    let filters = EquipmentFilters {
        sede_id: Some(id),
        ..Default::default()
    };
    let equipment = Equipment::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/sedes",
        Router::new()
            .route("/", get(list_sites).post(create_site))
            .route("/{id}", get(get_site).put(update_site).delete(delete_site))
            .route("/{id}/equipos", get(list_site_equipment)),
    )
}
