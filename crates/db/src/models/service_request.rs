use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;
use validator::Validate;

use crate::query::{Assignments, Filters, NEWEST_FIRST, Searchable, fetch_indexed, fetch_page};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "request_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestType {
    Preventivo,
    #[default]
    Correctivo,
    Instalacion,
    Garantia,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "request_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestPriority {
    Baja,
    #[default]
    Media,
    Alta,
    Urgente,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pendiente,
    Asignada,
    EnProceso,
    Cerrada,
    Cancelada,
}

/// A maintenance request raised by a client for one of its sites.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub sede_id: Uuid,
    pub equipo_id: Option<Uuid>,
    pub tipo: RequestType,
    pub prioridad: RequestPriority,
    pub descripcion: String,
    pub estado: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateServiceRequest {
    pub cliente_id: Uuid,
    pub sede_id: Uuid,
    pub equipo_id: Option<Uuid>,
    pub tipo: Option<RequestType>,
    pub prioridad: Option<RequestPriority>,
    #[validate(length(min = 1, max = 2000))]
    pub descripcion: String,
    pub estado: Option<RequestStatus>,
}

impl CreateServiceRequest {
    pub fn new(cliente_id: Uuid, sede_id: Uuid, descripcion: impl Into<String>) -> Self {
        Self {
            cliente_id,
            sede_id,
            equipo_id: None,
            tipo: None,
            prioridad: None,
            descripcion: descripcion.into(),
            estado: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateServiceRequest {
    pub equipo_id: Option<Uuid>,
    pub tipo: Option<RequestType>,
    pub prioridad: Option<RequestPriority>,
    #[validate(length(min = 1, max = 2000))]
    pub descripcion: Option<String>,
    pub estado: Option<RequestStatus>,
}

impl UpdateServiceRequest {
    pub fn is_empty(&self) -> bool {
        self.equipo_id.is_none()
            && self.tipo.is_none()
            && self.prioridad.is_none()
            && self.descripcion.is_none()
            && self.estado.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ServiceRequestFilters {
    pub search: Option<String>,
    pub cliente_id: Option<Uuid>,
    pub sede_id: Option<Uuid>,
    pub estado: Option<RequestStatus>,
    pub prioridad: Option<RequestPriority>,
}

impl Searchable for ServiceRequest {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.descripcion.as_str())]
    }
}

impl ServiceRequest {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ServiceRequest>(
            "SELECT * FROM solicitudes WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM solicitudes WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &ServiceRequestFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .raw("deleted_at IS NULL")
            .search(filters.search.as_deref())
            .eq("cliente_id", filters.cliente_id)
            .eq("sede_id", filters.sede_id)
            .eq("estado", filters.estado.map(|e| e.to_string()))
            .eq("prioridad", filters.prioridad.map(|p| p.to_string()));
        fetch_page(pool, "solicitudes", &filters, NEWEST_FIRST, page).await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateServiceRequest,
        request_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let query = sqlx::query_as::<_, ServiceRequest>(
            r#"INSERT INTO solicitudes (id, cliente_id, sede_id, equipo_id, tipo, prioridad, descripcion, estado)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
        .bind(request_id)
        .bind(data.cliente_id)
        .bind(data.sede_id)
        .bind(data.equipo_id)
        .bind(data.tipo.unwrap_or_default())
        .bind(data.prioridad.unwrap_or_default())
        .bind(&data.descripcion)
        .bind(data.estado.unwrap_or_default());
        fetch_indexed(pool, "solicitudes", request_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateServiceRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("solicitudes");
        set.set("equipo_id", data.equipo_id)
            .set("tipo", data.tipo)
            .set("prioridad", data.prioridad)
            .set("descripcion", data.descripcion.clone())
            .set("estado", data.estado);

        match set.finish(id, Some("deleted_at IS NULL")) {
            Some(mut qb) => {
                fetch_indexed(pool, "solicitudes", id, qb.build_query_as::<ServiceRequest>()).await
            }
            None => Self::find_by_id(pool, id).await,
        }
    }

    pub async fn soft_delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE solicitudes SET deleted_at = datetime('now', 'subsec') WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DBService,
        models::{
            client::{Client, CreateClient},
            site::{CreateSite, Site},
        },
    };

    #[tokio::test]
    async fn create_applies_defaults_and_filters_by_priority() {
        let db = DBService::new_in_memory().await.unwrap();
        let client = Client::create(&db.pool, &CreateClient::named("Acme"), Uuid::new_v4())
            .await
            .unwrap();
        let site = Site::create(&db.pool, &CreateSite::new(client.id, "Norte"), Uuid::new_v4())
            .await
            .unwrap();

        let normal = ServiceRequest::create(
            &db.pool,
            &CreateServiceRequest::new(client.id, site.id, "Revisión anual"),
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        assert_eq!(normal.tipo, RequestType::Correctivo);
        assert_eq!(normal.prioridad, RequestPriority::Media);
        assert_eq!(normal.estado, RequestStatus::Pendiente);

        let urgent = CreateServiceRequest {
            prioridad: Some(RequestPriority::Urgente),
            ..CreateServiceRequest::new(client.id, site.id, "Fuga en compresor")
        };
        ServiceRequest::create(&db.pool, &urgent, Uuid::new_v4())
            .await
            .unwrap();

        let filters = ServiceRequestFilters {
            prioridad: Some(RequestPriority::Urgente),
            ..Default::default()
        };
        let page = ServiceRequest::list(&db.pool, &filters, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].descripcion, "Fuga en compresor");
    }
}
