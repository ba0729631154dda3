use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, patch},
};
use db::models::{
    notification::{
        CreateNotification, MarkedRead, Notification, NotificationFilters, UnreadCount,
        UpdateNotification,
    },
    permission::{Action, AppModule},
    user::User,
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

const MODULE: AppModule = AppModule::Notificaciones;

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(filters): ApiQuery<NotificationFilters>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> Result<ResponseJson<ApiResponse<Page<Notification>>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let notifications = Notification::list_for_user(state.pool(), user.0.id(), &filters, &page).await?;
    Ok(ResponseJson(ApiResponse::success(notifications)))
}

pub async fn get_notification(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Notification>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let notification = Notification::find_for_user(state.pool(), id, user.0.id())
        .await?
        .ok_or(ApiError::NotFound("Notification"))?;
    Ok(ResponseJson(ApiResponse::success(notification)))
}

/// Sends a notification to any user.
pub async fn create_notification(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateNotification>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Notification>>), ApiError> {
    user.require(&state, MODULE, Action::Crear).await?;
    payload.validate()?;
    ensure_reference(
        User::find_by_id(state.pool(), payload.usuario_id).await?.is_some(),
        "usuario_id",
    )?;

    let notification = Notification::create(state.pool(), &payload, Uuid::new_v4()).await?;
    info!(
        notification_id = %notification.id,
        usuario_id = %notification.usuario_id,
        tipo = %notification.tipo,
        "Notification created"
    );
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success_with_message(notification, "Notification created")),
    ))
}

pub async fn update_notification(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateNotification>,
) -> Result<ResponseJson<ApiResponse<Notification>>, ApiError> {
    user.require(&state, MODULE, Action::Editar).await?;
    if payload.is_empty() {
        return Err(ApiError::EmptyUpdate);
    }
    payload.validate()?;

    let notification = Notification::update_for_user(state.pool(), id, user.0.id(), &payload)
        .await?
        .ok_or(ApiError::NotFound("Notification"))?;
    Ok(ResponseJson(ApiResponse::success(notification)))
}

/// PATCH /notificaciones/{id}/leer
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<Notification>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let notification = Notification::mark_read(state.pool(), id, user.0.id())
        .await?
        .ok_or(ApiError::NotFound("Notification"))?;
    Ok(ResponseJson(ApiResponse::success(notification)))
}

/// PATCH /notificaciones/leer-todas
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<MarkedRead>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let updated = Notification::mark_all_read(state.pool(), user.0.id()).await?;
    Ok(ResponseJson(ApiResponse::success(MarkedRead { updated })))
}

/// GET /notificaciones/no-leidas/count
pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<ApiResponse<UnreadCount>>, ApiError> {
    user.require(&state, MODULE, Action::Ver).await?;
    let count = Notification::unread_count(state.pool(), user.0.id()).await?;
    Ok(ResponseJson(ApiResponse::success(UnreadCount { count })))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    user.require(&state, MODULE, Action::Eliminar).await?;
    if Notification::delete_for_user(state.pool(), id, user.0.id()).await? == 0 {
        return Err(ApiError::NotFound("Notification"));
    }
    Ok(ResponseJson(ApiResponse::ok_message("Notification deleted")))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/notificaciones",
        Router::new()
            .route("/", get(list_notifications).post(create_notification))
            .route("/leer-todas", patch(mark_all_read))
            .route("/no-leidas/count", get(unread_count))
            .route(
                "/{id}",
                get(get_notification)
                    .put(update_notification)
                    .delete(delete_notification),
            )
            .route("/{id}/leer", patch(mark_notification_read)),
    )
}
