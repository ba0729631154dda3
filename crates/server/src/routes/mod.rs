use axum::Router;

use crate::{error::ApiError, state::AppState};

pub mod auth;
pub mod clients;
pub mod equipment;
pub mod health;
pub mod notifications;
pub mod permissions;
pub mod service_requests;
pub mod sites;
pub mod technicians;
pub mod users;
pub mod warehouse_requests;
pub mod work_orders;

/// Rejects a payload whose foreign key points at a missing or deleted record.
pub(crate) fn ensure_reference(found: bool, field: &'static str) -> Result<(), ApiError> {
    if found {
        Ok(())
    } else {
        Err(ApiError::InvalidReference { field })
    }
}

/// Every resource router, to be nested under the API prefix.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(clients::router())
        .merge(sites::router())
        .merge(equipment::router())
        .merge(technicians::router())
        .merge(service_requests::router())
        .merge(work_orders::router())
        .merge(warehouse_requests::router())
        .merge(notifications::router())
        .merge(permissions::router())
        .merge(users::router())
}
