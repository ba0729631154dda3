use db::models::service_request::{
    CreateServiceRequest, ServiceRequest, ServiceRequestFilters, UpdateServiceRequest,
};
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use crate::{client::ApiClient, error::ClientError};

pub async fn list(
    client: &ApiClient,
    filters: &ServiceRequestFilters,
    page: &PageRequest,
) -> Result<Page<ServiceRequest>, ClientError> {
    client.get_with_query("/solicitudes", filters, page).await
}

pub async fn get(client: &ApiClient, id: Uuid) -> Result<ServiceRequest, ClientError> {
    client.get(&format!("/solicitudes/{id}")).await
}

pub async fn create(
    client: &ApiClient,
    data: &CreateServiceRequest,
) -> Result<ServiceRequest, ClientError> {
    client.post("/solicitudes", data).await
}

pub async fn update(
    client: &ApiClient,
    id: Uuid,
    data: &UpdateServiceRequest,
) -> Result<ServiceRequest, ClientError> {
    client.put(&format!("/solicitudes/{id}"), data).await
}

pub async fn delete(client: &ApiClient, id: Uuid) -> Result<(), ClientError> {
    client.delete(&format!("/solicitudes/{id}")).await.map(|_| ())
}
