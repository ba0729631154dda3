use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;
use validator::Validate;

use crate::query::{Assignments, Filters, NEWEST_FIRST, Searchable, fetch_indexed, fetch_page};

/// A physical location (clinic, branch) belonging to a client.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Site {
    pub id: Uuid,
    pub cliente_id: Uuid, // Foreign key to Client
    pub nombre: String,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub telefono: Option<String>,
    pub contacto: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateSite {
    pub cliente_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub nombre: String,
    #[validate(length(max = 300))]
    pub direccion: Option<String>,
    #[validate(length(max = 100))]
    pub ciudad: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(length(max = 200))]
    pub contacto: Option<String>,
}

impl CreateSite {
    pub fn new(cliente_id: Uuid, nombre: impl Into<String>) -> Self {
        Self {
            cliente_id,
            nombre: nombre.into(),
            direccion: None,
            ciudad: None,
            telefono: None,
            contacto: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateSite {
    pub cliente_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub nombre: Option<String>,
    #[validate(length(max = 300))]
    pub direccion: Option<String>,
    #[validate(length(max = 100))]
    pub ciudad: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(length(max = 200))]
    pub contacto: Option<String>,
}

impl UpdateSite {
    pub fn is_empty(&self) -> bool {
        self.cliente_id.is_none()
            && self.nombre.is_none()
            && self.direccion.is_none()
            && self.ciudad.is_none()
            && self.telefono.is_none()
            && self.contacto.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct SiteFilters {
    pub search: Option<String>,
    pub cliente_id: Option<Uuid>,
    pub ciudad: Option<String>,
}

impl Searchable for Site {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.nombre.as_str()),
            self.direccion.as_deref(),
            self.ciudad.as_deref(),
            self.contacto.as_deref(),
        ]
    }
}

impl Site {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Site>("SELECT * FROM sedes WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sedes WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &SiteFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .raw("deleted_at IS NULL")
            .search(filters.search.as_deref())
            .eq("cliente_id", filters.cliente_id)
            .eq("ciudad", filters.ciudad.as_ref());
        fetch_page(pool, "sedes", &filters, NEWEST_FIRST, page).await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateSite,
        site_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let query = sqlx::query_as::<_, Site>(
            r#"INSERT INTO sedes (id, cliente_id, nombre, direccion, ciudad, telefono, contacto)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(site_id)
        .bind(data.cliente_id)
        .bind(&data.nombre)
        .bind(&data.direccion)
        .bind(&data.ciudad)
        .bind(&data.telefono)
        .bind(&data.contacto);
        fetch_indexed(pool, "sedes", site_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateSite,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("sedes");
        set.set("cliente_id", data.cliente_id)
            .set("nombre", data.nombre.clone())
            .set("direccion", data.direccion.clone())
            .set("ciudad", data.ciudad.clone())
            .set("telefono", data.telefono.clone())
            .set("contacto", data.contacto.clone());

        match set.finish(id, Some("deleted_at IS NULL")) {
            Some(mut qb) => fetch_indexed(pool, "sedes", id, qb.build_query_as::<Site>()).await,
            None => Self::find_by_id(pool, id).await,
        }
    }

    pub async fn soft_delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sedes SET deleted_at = datetime('now', 'subsec') WHERE id = $1 AND deleted_at IS NULL",
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
        models::client::{Client, CreateClient},
    };

    async fn seed_client(pool: &SqlitePool, nombre: &str) -> Client {
        Client::create(pool, &CreateClient::named(nombre), Uuid::new_v4())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn lists_sites_of_one_client() {
        let db = DBService::new_in_memory().await.unwrap();
        let acme = seed_client(&db.pool, "Acme").await;
        let other = seed_client(&db.pool, "Otro").await;

        for nombre in ["Sede Norte", "Sede Sur"] {
            Site::create(&db.pool, &CreateSite::new(acme.id, nombre), Uuid::new_v4())
                .await
                .unwrap();
        }
        Site::create(&db.pool, &CreateSite::new(other.id, "Principal"), Uuid::new_v4())
            .await
            .unwrap();

        let filters = SiteFilters {
            cliente_id: Some(acme.id),
            ..Default::default()
        };
        let page = Site::list(&db.pool, &filters, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 2);
        assert!(page.items.iter().all(|s| s.cliente_id == acme.id));
    }

    #[tokio::test]
    async fn create_rejects_unknown_client_at_the_database() {
        let db = DBService::new_in_memory().await.unwrap();
        let result =
            Site::create(&db.pool, &CreateSite::new(Uuid::new_v4(), "Huérfana"), Uuid::new_v4())
                .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_then_find_returns_none() {
        let db = DBService::new_in_memory().await.unwrap();
        let acme = seed_client(&db.pool, "Acme").await;
        let site = Site::create(&db.pool, &CreateSite::new(acme.id, "Norte"), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(Site::soft_delete(&db.pool, site.id).await.unwrap(), 1);
        assert!(Site::find_by_id(&db.pool, site.id).await.unwrap().is_none());
    }
}
