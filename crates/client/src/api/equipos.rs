use db::models::equipment::{CreateEquipment, Equipment, EquipmentFilters, UpdateEquipment};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &EquipmentFilters,
    page: &PageRequest,
) -> Result<Page<Equipment>, ClientError> {
    client.get_with_query("/equipos", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<Equipment, ClientError> {
    client.get(&format!("/equipos/{id}")).await
}

pub async fn create(client: &ApiClient, data: &CreateEquipment) -> Result<Equipment, ClientError> {
    client.post("/equipos", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdateEquipment,
) -> Result<Equipment, ClientError> {
    client.put(&format!("/equipos/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/equipos/{id}")).await.map(|_| ())
}
