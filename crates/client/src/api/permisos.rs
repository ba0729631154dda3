use db::models::{
    permission::{CreatePermission, Permission, PermissionFilters, UpdatePermission},
    user::UserRole,
};
use services::services::permissions::ModuleAccess;
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &PermissionFilters,
    page: &PageRequest,
) -> Result<Page<Permission>, ClientError> {
    client.get_with_query("/permisos", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<Permission, ClientError> {
    client.get(&format!("/permisos/{id}")).await
}

pub async fn create(client: &ApiClient, data: &CreatePermission) -> Result<Permission, ClientError> {
    client.post("/permisos", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdatePermission,
) -> Result<Permission, ClientError> {
    client.put(&format!("/permisos/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/permisos/{id}")).await.map(|_| ())
}

/// Effective access of `rol` on every module.
pub async fn by_role(client: &ApiClient, rol: UserRole) -> Result<Vec<ModuleAccess>, ClientError> {
    client.get(&format!("/permisos/rol/{rol}")).await
}

/// Effective access of the logged-in user.
pub async fn mine(client: &ApiClient) -> Result<Vec<ModuleAccess>, ClientError> {
    client.get("/permisos/mios").await
}
