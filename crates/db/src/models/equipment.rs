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
#[sqlx(type_name = "equipment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Operativo,
    EnMantenimiento,
    FueraDeServicio,
    DadoDeBaja,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Equipment {
    pub id: Uuid,
    pub sede_id: Uuid, // Foreign key to Site
    pub nombre: String,
    pub marca: Option<String>,
    pub modelo: Option<String>,
    pub serie: Option<String>,
    pub tipo: Option<String>, // Free-form category (unidad dental, autoclave, rayos x…)
    pub estado: EquipmentStatus,
    pub fecha_instalacion: Option<NaiveDate>,
    pub ultimo_mantenimiento: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateEquipment {
    pub sede_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub nombre: String,
    #[validate(length(max = 100))]
    pub marca: Option<String>,
    #[validate(length(max = 100))]
    pub modelo: Option<String>,
    #[validate(length(max = 100))]
    pub serie: Option<String>,
    #[validate(length(max = 100))]
    pub tipo: Option<String>,
    pub estado: Option<EquipmentStatus>,
    pub fecha_instalacion: Option<NaiveDate>,
    pub ultimo_mantenimiento: Option<NaiveDate>,
}

impl CreateEquipment {
    pub fn new(sede_id: Uuid, nombre: impl Into<String>) -> Self {
        Self {
            sede_id,
            nombre: nombre.into(),
            marca: None,
            modelo: None,
            serie: None,
            tipo: None,
            estado: None,
            fecha_instalacion: None,
            ultimo_mantenimiento: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateEquipment {
    pub sede_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub nombre: Option<String>,
    #[validate(length(max = 100))]
    pub marca: Option<String>,
    #[validate(length(max = 100))]
    pub modelo: Option<String>,
    #[validate(length(max = 100))]
    pub serie: Option<String>,
    #[validate(length(max = 100))]
    pub tipo: Option<String>,
    pub estado: Option<EquipmentStatus>,
    pub fecha_instalacion: Option<NaiveDate>,
    pub ultimo_mantenimiento: Option<NaiveDate>,
}

impl UpdateEquipment {
    pub fn is_empty(&self) -> bool {
        self.sede_id.is_none()
            && self.nombre.is_none()
            && self.marca.is_none()
            && self.modelo.is_none()
            && self.serie.is_none()
            && self.tipo.is_none()
            && self.estado.is_none()
            && self.fecha_instalacion.is_none()
            && self.ultimo_mantenimiento.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct EquipmentFilters {
    pub search: Option<String>,
    pub sede_id: Option<Uuid>,
    pub estado: Option<EquipmentStatus>,
    pub tipo: Option<String>,
}

impl Searchable for Equipment {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.nombre.as_str()),
            self.marca.as_deref(),
            self.modelo.as_deref(),
            self.serie.as_deref(),
        ]
    }
}

impl Equipment {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipos WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM equipos WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &EquipmentFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .raw("deleted_at IS NULL")
            .search(filters.search.as_deref())
            .eq("sede_id", filters.sede_id)
            .eq("estado", filters.estado.map(|e| e.to_string()))
            .eq("tipo", filters.tipo.as_ref());
        fetch_page(pool, "equipos", &filters, NEWEST_FIRST, page).await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateEquipment,
        equipment_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let query = sqlx::query_as::<_, Equipment>(
            r#"INSERT INTO equipos (id, sede_id, nombre, marca, modelo, serie, tipo, estado, fecha_instalacion, ultimo_mantenimiento)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
               RETURNING *"#,
        )
        .bind(equipment_id)
        .bind(data.sede_id)
        .bind(&data.nombre)
        .bind(&data.marca)
        .bind(&data.modelo)
        .bind(&data.serie)
        .bind(&data.tipo)
        .bind(data.estado.unwrap_or_default())
        .bind(data.fecha_instalacion)
        .bind(data.ultimo_mantenimiento);
        fetch_indexed(pool, "equipos", equipment_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateEquipment,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("equipos");
        set.set("sede_id", data.sede_id)
            .set("nombre", data.nombre.clone())
            .set("marca", data.marca.clone())
            .set("modelo", data.modelo.clone())
            .set("serie", data.serie.clone())
            .set("tipo", data.tipo.clone())
            .set("estado", data.estado)
            .set("fecha_instalacion", data.fecha_instalacion)
            .set("ultimo_mantenimiento", data.ultimo_mantenimiento);

        match set.finish(id, Some("deleted_at IS NULL")) {
            Some(mut qb) => {
                fetch_indexed(pool, "equipos", id, qb.build_query_as::<Equipment>()).await
            }
            None => Self::find_by_id(pool, id).await,
        }
    }

    pub async fn soft_delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE equipos SET deleted_at = datetime('now', 'subsec') WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
