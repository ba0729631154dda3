use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;
use validator::Validate;

use crate::query::{Assignments, Filters, NEWEST_FIRST, Searchable, fetch_indexed, fetch_page};

/// Closed set of order states. Transitions are not restricted; any state
/// may be written over any other.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Executed,
    Cancelled,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct WorkOrder {
    pub id: Uuid,
    pub numero: String, // OT-000123
    pub solicitud_id: Uuid,
    pub equipo_id: Uuid,
    pub tecnico_id: Option<Uuid>,
    pub estado: OrderStatus,
    pub fecha_programada: Option<NaiveDate>,
    pub fecha_ejecucion: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateWorkOrder {
    pub solicitud_id: Uuid,
    pub equipo_id: Uuid,
    pub tecnico_id: Option<Uuid>,
    pub estado: Option<OrderStatus>,
    pub fecha_programada: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub observaciones: Option<String>,
}

impl CreateWorkOrder {
    pub fn new(solicitud_id: Uuid, equipo_id: Uuid) -> Self {
        Self {
            solicitud_id,
            equipo_id,
            tecnico_id: None,
            estado: None,
            fecha_programada: None,
            observaciones: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateWorkOrder {
    pub equipo_id: Option<Uuid>,
    pub tecnico_id: Option<Uuid>,
    pub estado: Option<OrderStatus>,
    pub fecha_programada: Option<NaiveDate>,
    pub fecha_ejecucion: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub observaciones: Option<String>,
}

impl UpdateWorkOrder {
    pub fn is_empty(&self) -> bool {
        self.equipo_id.is_none()
            && self.tecnico_id.is_none()
            && self.estado.is_none()
            && self.fecha_programada.is_none()
            && self.fecha_ejecucion.is_none()
            && self.observaciones.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateOrderStatus {
    pub estado: OrderStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct WorkOrderFilters {
    pub search: Option<String>,
    pub estado: Option<OrderStatus>,
    pub tecnico_id: Option<Uuid>,
    pub equipo_id: Option<Uuid>,
    pub solicitud_id: Option<Uuid>,
    /// Inclusive lower bound on `fecha_programada`
    pub desde: Option<NaiveDate>,
    /// Inclusive upper bound on `fecha_programada`
    pub hasta: Option<NaiveDate>,
}

/// Count of live orders per status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct OrderStats {
    pub pending: i64,
    pub in_progress: i64,
    pub executed: i64,
    pub cancelled: i64,
    pub total: i64,
}

impl Searchable for WorkOrder {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.numero.as_str()),
            self.observaciones.as_deref(),
        ]
    }
}

impl WorkOrder {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkOrder>("SELECT * FROM ordenes WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ordenes WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &WorkOrderFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .raw("deleted_at IS NULL")
            .search(filters.search.as_deref())
            .eq("estado", filters.estado.map(|e| e.to_string()))
            .eq("tecnico_id", filters.tecnico_id)
            .eq("equipo_id", filters.equipo_id)
            .eq("solicitud_id", filters.solicitud_id)
            .gte("fecha_programada", filters.desde)
            .lte("fecha_programada", filters.hasta);
        fetch_page(pool, "ordenes", &filters, NEWEST_FIRST, page).await
    }

    /// Inserts the order with the next `OT-NNNNNN` number. The number is
    /// computed inside the INSERT so two concurrent creates cannot read the
    /// same maximum; soft-deleted orders keep their numbers reserved.
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateWorkOrder,
        order_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let query = sqlx::query_as::<_, WorkOrder>(
            r#"INSERT INTO ordenes (id, numero, solicitud_id, equipo_id, tecnico_id, estado, fecha_programada, observaciones)
               VALUES (
                   $1,
                   (SELECT 'OT-' || printf('%06d', COALESCE(MAX(CAST(SUBSTR(numero, 4) AS INTEGER)), 0) + 1) FROM ordenes),
                   $2, $3, $4, $5, $6, $7
               )
               RETURNING *"#,
        )
        .bind(order_id)
        .bind(data.solicitud_id)
        .bind(data.equipo_id)
        .bind(data.tecnico_id)
        .bind(data.estado.unwrap_or_default())
        .bind(data.fecha_programada)
        .bind(&data.observaciones);
        fetch_indexed(pool, "ordenes", order_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateWorkOrder,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("ordenes");
        set.set("equipo_id", data.equipo_id)
            .set("tecnico_id", data.tecnico_id)
            .set("estado", data.estado)
            .set("fecha_programada", data.fecha_programada)
            .set("fecha_ejecucion", data.fecha_ejecucion)
            .set("observaciones", data.observaciones.clone());

        match set.finish(id, Some("deleted_at IS NULL")) {
            Some(mut qb) => {
                fetch_indexed(pool, "ordenes", id, qb.build_query_as::<WorkOrder>()).await
            }
            None => Self::find_by_id(pool, id).await,
        }
    }

    /// Writes `estado` unconditionally. Entering `executed` stamps today's
    /// date as the execution date unless one was already recorded.
    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkOrder>(
            r#"UPDATE ordenes
               SET estado = $2,
                   fecha_ejecucion = CASE WHEN $2 = 'executed' THEN COALESCE(fecha_ejecucion, date('now')) ELSE fecha_ejecucion END,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND deleted_at IS NULL
               RETURNING *"#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    pub async fn stats(pool: &SqlitePool) -> Result<OrderStats, sqlx::Error> {
        let rows: Vec<(OrderStatus, i64)> = sqlx::query_as(
            "SELECT estado, COUNT(*) FROM ordenes WHERE deleted_at IS NULL GROUP BY estado",
        )
        .fetch_all(pool)
        .await?;

        let mut stats = OrderStats::default();
        for (status, count) in rows {
            match status {
                OrderStatus::Pending => stats.pending = count,
                OrderStatus::InProgress => stats.in_progress = count,
                OrderStatus::Executed => stats.executed = count,
                OrderStatus::Cancelled => stats.cancelled = count,
            }
            stats.total += count;
        }
        Ok(stats)
    }

    pub async fn soft_delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE ordenes SET deleted_at = datetime('now', 'subsec') WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
