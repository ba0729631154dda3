use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;
use validator::Validate;

use crate::query::{Assignments, Filters, NEWEST_FIRST, Searchable, fetch_indexed, fetch_page};

/// Field technician. Deactivated (`activo = false`) instead of deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Technician {
    pub id: Uuid,
    pub nombre: String,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub especialidad: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateTechnician {
    #[validate(length(min = 1, max = 200))]
    pub nombre: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(length(max = 100))]
    pub especialidad: Option<String>,
}

impl CreateTechnician {
    pub fn named(nombre: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            email: None,
            telefono: None,
            especialidad: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateTechnician {
    #[validate(length(min = 1, max = 200))]
    pub nombre: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(length(max = 100))]
    pub especialidad: Option<String>,
    pub activo: Option<bool>,
}

impl UpdateTechnician {
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.email.is_none()
            && self.telefono.is_none()
            && self.especialidad.is_none()
            && self.activo.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct TechnicianFilters {
    pub search: Option<String>,
    pub especialidad: Option<String>,
    /// Defaults to active technicians only.
    pub activo: Option<bool>,
}

impl Searchable for Technician {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.nombre.as_str()),
            self.email.as_deref(),
            self.especialidad.as_deref(),
        ]
    }
}

impl Technician {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Technician>("SELECT * FROM tecnicos WHERE id = $1 AND activo = 1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists_active(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tecnicos WHERE id = $1 AND activo = 1",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &TechnicianFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .eq("activo", Some(filters.activo.unwrap_or(true)))
            .search(filters.search.as_deref())
            .eq("especialidad", filters.especialidad.as_ref());
        fetch_page(pool, "tecnicos", &filters, NEWEST_FIRST, page).await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTechnician,
        technician_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let query = sqlx::query_as::<_, Technician>(
            r#"INSERT INTO tecnicos (id, nombre, email, telefono, especialidad)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(technician_id)
        .bind(&data.nombre)
        .bind(&data.email)
        .bind(&data.telefono)
        .bind(&data.especialidad);
        fetch_indexed(pool, "tecnicos", technician_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Deactivated technicians are only reachable by a payload that sets
    /// `activo: true`; any other update on them returns `None`, like `find_by_id`.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateTechnician,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("tecnicos");
        set.set("nombre", data.nombre.clone())
            .set("email", data.email.clone())
            .set("telefono", data.telefono.clone())
            .set("especialidad", data.especialidad.clone())
            .set("activo", data.activo);

        let scope = (data.activo != Some(true)).then_some("activo = 1");
        match set.finish(id, scope) {
            Some(mut qb) => {
                fetch_indexed(pool, "tecnicos", id, qb.build_query_as::<Technician>()).await
            }
            None => Self::find_by_id(pool, id).await,
        }
    }

    /// Soft delete: flips `activo` off.
    pub async fn deactivate(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tecnicos SET activo = 0, updated_at = datetime('now', 'subsec') WHERE id = $1 AND activo = 1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
