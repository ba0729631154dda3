//! The caller's own inbox. The server scopes every call to the logged-in user.

use db::models::notification::{
    CreateNotification, MarkedRead, Notification, NotificationFilters, UnreadCount,
    UpdateNotification,
};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &NotificationFilters,
    page: &PageRequest,
) -> Result<Page<Notification>, ClientError> {
    client.get_with_query("/notificaciones", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<Notification, ClientError> {
    client.get(&format!("/notificaciones/{id}")).await
}

/// Sends a notification to `data.usuario_id`.
pub async fn create(client: &ApiClient, data: &CreateNotification) -> Result<Notification, ClientError> {
    client.post("/notificaciones", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdateNotification,
) -> Result<Notification, ClientError> {
    client.put(&format!("/notificaciones/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client
        .delete(&format!("/notificaciones/{id}"))
        .await
        .map(|_| ())
}

pub async fn mark_read(client: &ApiClient, id: Uuid) -> Result<Notification, ClientError> {
    client
        .patch_empty(&format!("/notificaciones/{id}/leer"))
        .await
}

/// Returns how many notifications were flipped to read.
pub async fn mark_all_read(client: &ApiClient) -> Result<u64, ClientError> {
    let marked: MarkedRead = client.patch_empty("/notificaciones/leer-todas").await?;
    Ok(marked.updated)
}

pub async fn unread_count(client: &ApiClient) -> Result<i64, ClientError> {
    let unread: UnreadCount = client.get("/notificaciones/no-leidas/count").await?;
    Ok(unread.count)
}
