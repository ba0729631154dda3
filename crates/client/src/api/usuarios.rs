use db::models::user::{CreateUserRequest, UpdateUserRequest, User, UserFilters};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &UserFilters,
    page: &PageRequest,
) -> Result<Page<User>, ClientError> {
    client.get_with_query("/usuarios", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<User, ClientError> {
    client.get(&format!("/usuarios/{id}")).await
}

pub async fn create(client: &ApiClient, data: &CreateUserRequest) -> Result<User, ClientError> {
    client.post("/usuarios", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdateUserRequest,
) -> Result<User, ClientError> {
    client.put(&format!("/usuarios/{id}"), data).await
}

/// Deactivates the account and closes its sessions.
pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/usuarios/{id}")).await.map(|_| ())
}
