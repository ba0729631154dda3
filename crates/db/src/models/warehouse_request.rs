use chrono::{DateTime, NaiveDate, Utc};
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
#[sqlx(type_name = "warehouse_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarehouseStatus {
    #[default]
    Pendiente,
    Aprobada,
    Despachada,
    Entregada,
    Rechazada,
}

/// Request for parts/consumables from the warehouse, usually tied to a work order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct WarehouseRequest {
    pub id: Uuid,
    pub orden_id: Option<Uuid>,
    pub tecnico_id: Option<Uuid>,
    pub descripcion: String,
    pub cantidad: i64,
    pub estado: WarehouseStatus,
    pub fecha_solicitud: NaiveDate,
    pub fecha_aprobacion: Option<NaiveDate>,
    pub fecha_despacho: Option<NaiveDate>,
    pub fecha_entrega: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateWarehouseRequest {
    pub orden_id: Option<Uuid>,
    pub tecnico_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2000))]
    pub descripcion: String,
    #[validate(range(min = 1, max = 100000))]
    pub cantidad: Option<i64>,
    /// Defaults to the current date
    pub fecha_solicitud: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub observaciones: Option<String>,
}

impl CreateWarehouseRequest {
    pub fn new(descripcion: impl Into<String>) -> Self {
        Self {
            orden_id: None,
            tecnico_id: None,
            descripcion: descripcion.into(),
            cantidad: None,
            fecha_solicitud: None,
            observaciones: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateWarehouseRequest {
    pub orden_id: Option<Uuid>,
    pub tecnico_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2000))]
    pub descripcion: Option<String>,
    #[validate(range(min = 1, max = 100000))]
    pub cantidad: Option<i64>,
    pub estado: Option<WarehouseStatus>,
    pub fecha_solicitud: Option<NaiveDate>,
    pub fecha_aprobacion: Option<NaiveDate>,
    pub fecha_despacho: Option<NaiveDate>,
    pub fecha_entrega: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub observaciones: Option<String>,
}

impl UpdateWarehouseRequest {
    pub fn is_empty(&self) -> bool {
        self.orden_id.is_none()
            && self.tecnico_id.is_none()
            && self.descripcion.is_none()
            && self.cantidad.is_none()
            && self.estado.is_none()
            && self.fecha_solicitud.is_none()
            && self.fecha_aprobacion.is_none()
            && self.fecha_despacho.is_none()
            && self.fecha_entrega.is_none()
            && self.observaciones.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct WarehouseRequestFilters {
    pub search: Option<String>,
    pub estado: Option<WarehouseStatus>,
    pub orden_id: Option<Uuid>,
    pub tecnico_id: Option<Uuid>,
}

impl Searchable for WarehouseRequest {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.descripcion.as_str()),
            self.observaciones.as_deref(),
        ]
    }
}

impl WarehouseRequest {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WarehouseRequest>(
            "SELECT * FROM solicitudes_bodega WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &WarehouseRequestFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .raw("deleted_at IS NULL")
            .search(filters.search.as_deref())
            .eq("estado", filters.estado.map(|e| e.to_string()))
            .eq("orden_id", filters.orden_id)
            .eq("tecnico_id", filters.tecnico_id);
        fetch_page(pool, "solicitudes_bodega", &filters, NEWEST_FIRST, page).await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateWarehouseRequest,
        request_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let fecha_solicitud = data
            .fecha_solicitud
            .unwrap_or_else(|| Utc::now().date_naive());
        let query = sqlx::query_as::<_, WarehouseRequest>(
            r#"INSERT INTO solicitudes_bodega (id, orden_id, tecnico_id, descripcion, cantidad, fecha_solicitud, observaciones)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(request_id)
        .bind(data.orden_id)
        .bind(data.tecnico_id)
        .bind(&data.descripcion)
        .bind(data.cantidad.unwrap_or(1))
        .bind(fecha_solicitud)
        .bind(&data.observaciones);
        fetch_indexed(pool, "solicitudes_bodega", request_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateWarehouseRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("solicitudes_bodega");
        set.set("orden_id", data.orden_id)
            .set("tecnico_id", data.tecnico_id)
            .set("descripcion", data.descripcion.clone())
            .set("cantidad", data.cantidad)
            .set("estado", data.estado)
            .set("fecha_solicitud", data.fecha_solicitud)
            .set("fecha_aprobacion", data.fecha_aprobacion)
            .set("fecha_despacho", data.fecha_despacho)
            .set("fecha_entrega", data.fecha_entrega)
            .set("observaciones", data.observaciones.clone());

        match set.finish(id, Some("deleted_at IS NULL")) {
            Some(mut qb) => {
                let query = qb.build_query_as::<WarehouseRequest>();
                fetch_indexed(pool, "solicitudes_bodega", id, query).await
            }
            None => Self::find_by_id(pool, id).await,
        }
    }

    pub async fn soft_delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE solicitudes_bodega SET deleted_at = datetime('now', 'subsec') WHERE id = $1 AND deleted_at IS NULL",
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
        models::work_order::{CreateWorkOrder, WorkOrder, tests::seed_request},
    };

    #[tokio::test]
    async fn create_defaults_request_date_and_quantity() {
        let db = DBService::new_in_memory().await.unwrap();
        let created = WarehouseRequest::create(
            &db.pool,
            &CreateWarehouseRequest::new("Filtro de aire"),
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        assert_eq!(created.cantidad, 1);
        assert_eq!(created.estado, WarehouseStatus::Pendiente);
        assert_eq!(created.fecha_solicitud, Utc::now().date_naive());
        assert!(created.fecha_entrega.is_none());
    }

    #[tokio::test]
    async fn recording_dates_moves_request_along() {
        let db = DBService::new_in_memory().await.unwrap();
        let data = CreateWarehouseRequest {
            fecha_solicitud: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..CreateWarehouseRequest::new("Lámpara de fotocurado")
        };
        let created = WarehouseRequest::create(&db.pool, &data, Uuid::new_v4())
            .await
            .unwrap();

        let updated = WarehouseRequest::update(
            &db.pool,
            created.id,
            &UpdateWarehouseRequest {
                estado: Some(WarehouseStatus::Despachada),
                fecha_aprobacion: NaiveDate::from_ymd_opt(2025, 3, 2),
                fecha_despacho: NaiveDate::from_ymd_opt(2025, 3, 4),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.estado, WarehouseStatus::Despachada);
        assert_eq!(updated.fecha_solicitud, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(updated.fecha_despacho, NaiveDate::from_ymd_opt(2025, 3, 4));
    }

    #[tokio::test]
    async fn list_filters_by_order() {
        let db = DBService::new_in_memory().await.unwrap();
        let (request, equipment) = seed_request(&db.pool).await;
        let order = WorkOrder::create(
            &db.pool,
            &CreateWorkOrder::new(request.id, equipment.id),
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let linked = CreateWarehouseRequest {
            orden_id: Some(order.id),
            cantidad: Some(4),
            ..CreateWarehouseRequest::new("Empaques de puerta")
        };
        WarehouseRequest::create(&db.pool, &linked, Uuid::new_v4())
            .await
            .unwrap();
        WarehouseRequest::create(&db.pool, &CreateWarehouseRequest::new("Suelto"), Uuid::new_v4())
            .await
            .unwrap();

        let page = WarehouseRequest::list(
            &db.pool,
            &WarehouseRequestFilters {
                orden_id: Some(order.id),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].cantidad, 4);
    }

    #[tokio::test]
    async fn deleted_requests_are_excluded() {
        let db = DBService::new_in_memory().await.unwrap();
        let created = WarehouseRequest::create(
            &db.pool,
            &CreateWarehouseRequest::new("Guantes"),
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        WarehouseRequest::soft_delete(&db.pool, created.id).await.unwrap();

        let page = WarehouseRequest::list(
            &db.pool,
            &WarehouseRequestFilters::default(),
            &PageRequest::default(),
        )
        .await
        .unwrap();
        assert!(page.items.is_empty());
        assert!(WarehouseRequest::find_by_id(&db.pool, created.id).await.unwrap().is_none());
    }
}
