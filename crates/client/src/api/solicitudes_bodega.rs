use db::models::warehouse_request::{
    CreateWarehouseRequest, UpdateWarehouseRequest, WarehouseRequest, WarehouseRequestFilters,
};
use services::services::tracking::WarehouseTracking;
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &WarehouseRequestFilters,
    page: &PageRequest,
) -> Result<Page<WarehouseRequest>, ClientError> {
    client.get_with_query("/solicitudes-bodega", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<WarehouseRequest, ClientError> {
    client.get(&format!("/solicitudes-bodega/{id}")).await
}

pub async fn create(
    client: &ApiClient,
    data: &CreateWarehouseRequest,
) -> Result<WarehouseRequest, ClientError> {
    client.post("/solicitudes-bodega", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdateWarehouseRequest,
) -> Result<WarehouseRequest, ClientError> {
    client.put(&format!("/solicitudes-bodega/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/solicitudes-bodega/{id}")).await.map(|_| ())
}

/// The request plus its derived progress, days elapsed and timeline.
pub async fn seguimiento(client: &ApiClient, id: Uuid) -> Result<WarehouseTracking, ClientError> {
    client
        .get(&format!("/solicitudes-bodega/{id}/seguimiento"))
        .await
}
