use db::models::work_order::{
    CreateWorkOrder, OrderStats, OrderStatus, UpdateOrderStatus, UpdateWorkOrder, WorkOrder,
    WorkOrderFilters,
};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &WorkOrderFilters,
    page: &PageRequest,
) -> Result<Page<WorkOrder>, ClientError> {
    client.get_with_query("/ordenes", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<WorkOrder, ClientError> {
    client.get(&format!("/ordenes/{id}")).await
}

pub async fn create(client: &ApiClient, data: &CreateWorkOrder) -> Result<WorkOrder, ClientError> {
    client.post("/ordenes", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdateWorkOrder,
) -> Result<WorkOrder, ClientError> {
    client.put(&format!("/ordenes/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/ordenes/{id}")).await.map(|_| ())
}

pub async fn update_status(
    client: &ApiClient,
    id: Uuid,
    estado: OrderStatus,
) -> Result<WorkOrder, ClientError> {
    client
        .patch(&format!("/ordenes/{id}/estado"), &UpdateOrderStatus { estado })
        .await
}

/// Order count per status.
pub async fn stats(client: &ApiClient) -> Result<OrderStats, ClientError> {
    client.get("/ordenes/estadisticas").await
}
