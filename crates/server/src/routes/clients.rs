use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    client::{Client, ClientFilters, CreateClient, UpdateClient},
    permission::{Action, AppModule},
    site::{Site, SiteFilters},
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

const MODULE: AppModule = AppModule::Clientes;

pub async fn list_clients(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<ClientFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<Client>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let clients = Client::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(clients)))
}

pub async fn get_client(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let client = Client::find_by_id(state.pool(), id)
        .await?
        .ok_or(ApiError::NotFound("Client"))?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn create_client(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateClient>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Client>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;

    let client = Client::create(state.pool(), &payload, Uuid::new_v4()).await?;
    info!(client_id = %client.id, nombre = %client.nombre, "Client created");
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(client, "Client created")),
    ))
}

pub async fn update_client(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateClient>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;

    let client = Client::update(state.pool(), id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Client"))?;
    Ok(ResponseJson(ApiResponse::success_with_message(client, "Client updated")))
}

pub async fn delete_client(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if Client::soft_delete(state.pool(), id).await? == 0 {
        return Err(ApiError::NotFound("Client"));
    }
    info!(client_id = %id, "Client deleted");
    Ok(ResponseJson(ApiResponse::ok_message("Client deleted")))
}

/// GET /clientes/{id}/sedes
pub async fn list_client_sites(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<Site>>>, ApiError> {
    user.require(&state, AppModule::Sedes, Action::Ver).await?;
    if !Client::exists(state.pool(), id).await? {
        return Err(ApiError::NotFound("Client"));
    }
    let filters = SiteFilters {
        cliente_id: Some(id),
        ..Default::default()
    };
    let sites = Site::list(state.pool(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(sites)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/clientes",
        Router::new()
            .route("/", get(list_clients).post(create_client))
            .route("/{id}", get(get_client).put(update_client).delete(delete_client))
            .route("/{id}/sedes", get(list_client_sites)),
    )
}
