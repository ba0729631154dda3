use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    equipment::{CreateEquipment, Equipment, EquipmentFilters, UpdateEquipment},
    permission::{Action, AppModule},
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

const MODULE: AppModule = AppModule::Equipos;

pub async fn list_equipment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<EquipmentFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<Equipment>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let equipment = Equipment::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn get_equipment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Equipment>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let equipment = Equipment::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Equipment"))?;
    Ok(ResponseJson(ApiResponse::success(equipment)))
}

pub async fn create_equipment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateEquipment>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Equipment>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;
    ensure_reference(Site::exists(state.pool(), payload.sede_id).await?, "sede_id")?;

    let equipment = Equipment::create(state.pool(), &payload, Uuid::new_v4()).await?;
    info!(equipment_id = %equipment.id, sede_id = %equipment.sede_id, "Equipment created");
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(equipment, "Equipment created")),
    ))
}

pub async fn update_equipment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateEquipment>,
) -> Result<ResponseJson<ApiResponse<Equipment>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;
    if let Some(sede_id) = payload.sede_id {
        ensure_reference(Site::exists(state.pool(), sede_id).await?, "sede_id")?;
    }

    let equipment = Equipment::update(state.pool(), id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Equipment"))?;
    Ok(ResponseJson(ApiResponse::success_with_message(equipment, "Equipment updated")))
}

pub async fn delete_equipment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if Equipment::soft_delete(state.pool(), id).await? == 0 {
        return Err(ApiError::NotFound("Equipment"));
    }
    info!(equipment_id = %id, "Equipment deleted");
    Ok(ResponseJson(ApiResponse::ok_message("Equipment deleted")))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/equipos",
        Router::new()
            .route("/", get(list_equipment).post(create_equipment))
            .route(
                "/{id}",
                get(get_equipment).put(update_equipment).delete(delete_equipment),
            ),
    )
}
