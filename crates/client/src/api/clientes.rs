use db::models::{
    client::{Client, ClientFilters, CreateClient, UpdateClient},
    site::Site,
};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &ClientFilters,
    page: &PageRequest,
) -> Result<Page<Client>, ClientError> {
    client.get_with_query("/clientes", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<Client, ClientError> {
    client.get(&format!("/clientes/{id}")).await
}

pub async fn create(client: &ApiClient, data: &CreateClient) -> Result<Client, ClientError> {
    client.post("/clientes", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdateClient,
) -> Result<Client, ClientError> {
    client.put(&format!("/clientes/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/clientes/{id}")).await.map(|_| ())
}

/// Sites of one client (`GET /clientes/{id}/sedes`).
pub async fn sedes(
    client: &ApiClient,
    id: Uuid,
    page: &PageRequest,
) -> Result<Page<Site>, ClientError> {
    client
        .get_paged(&format!("/clientes/{id}/sedes"), page)
        .await
}
