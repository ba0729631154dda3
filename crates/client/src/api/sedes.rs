use db::models::{
    site::{CreateSite, Site, SiteFilters, UpdateSite},
    equipment::Equipment,
};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &SiteFilters,
    page: &PageRequest,
) -> Result<Page<Site>, ClientError> {
    client.get_with_query("/sedes", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<Site, ClientError> {
    client.get(&format!("/sedes/{id}")).await
}

pub async fn create(client: &ApiClient, data: &CreateSite) -> Result<Site, ClientError> {
    client.post("/sedes", data).await
}

pub async fn update(client: &ApiClient, id: Uuid, data: &UpdateSite) -> Result<Site, ClientError> {
    client.put(&format!("/sedes/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/sedes/{id}")).await.map(|_| ())
}

/// Equipment installed at one site (`GET /sedes/{id}/equipos`).
pub async fn equipos(
    client: &ApiClient,
    id: Uuid,
    page: &PageRequest,
) -> Result<Page<Equipment>, ClientError> {
    client
        .get_paged(&format!("/sedes/{id}/equipos"), page)
        .await
}
