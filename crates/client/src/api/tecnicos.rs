use db::models::technician::{CreateTechnician, Technician, TechnicianFilters, UpdateTechnician};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &TechnicianFilters,
    page: &PageRequest,
) -> Result<Page<Technician>, ClientError> {
    client.get_with_query("/tecnicos", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<Technician, ClientError> {
    client.get(&format!("/tecnicos/{id}")).await
}

pub async fn create(
    client: &ApiClient,
    data: &CreateTechnician,
) -> Result<Technician, ClientError> {
    client.post("/tecnicos", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdateTechnician,
) -> Result<Technician, ClientError> {
    client.put(&format!("/tecnicos/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/tecnicos/{id}")).await.map(|_| ())
}
