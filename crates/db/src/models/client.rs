use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;
use validator::Validate;

use crate::query::{Assignments, Filters, NEWEST_FIRST, Searchable, fetch_indexed, fetch_page};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Client {
    pub id: Uuid,
    pub nombre: String,
    pub nit: Option<String>, // Tax id
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub ciudad: Option<String>,
    pub contacto: Option<String>, // Contact person at the client
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateClient {
    #[validate(length(min = 1, max = 200))]
    pub nombre: String,
    #[validate(length(max = 30))]
    pub nit: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(length(max = 300))]
    pub direccion: Option<String>,
    #[validate(length(max = 100))]
    pub ciudad: Option<String>,
    #[validate(length(max = 200))]
    pub contacto: Option<String>,
    pub activo: Option<bool>,
}

impl CreateClient {
    pub fn named(nombre: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            nit: None,
            email: None,
            telefono: None,
            direccion: None,
            ciudad: None,
            contacto: None,
            activo: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateClient {
    #[validate(length(min = 1, max = 200))]
    pub nombre: Option<String>,
    #[validate(length(max = 30))]
    pub nit: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub telefono: Option<String>,
    #[validate(length(max = 300))]
    pub direccion: Option<String>,
    #[validate(length(max = 100))]
    pub ciudad: Option<String>,
    #[validate(length(max = 200))]
    pub contacto: Option<String>,
    pub activo: Option<bool>,
}

impl UpdateClient {
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.nit.is_none()
            && self.email.is_none()
            && self.telefono.is_none()
            && self.direccion.is_none()
            && self.ciudad.is_none()
            && self.contacto.is_none()
            && self.activo.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ClientFilters {
    pub search: Option<String>,
    pub ciudad: Option<String>,
    pub activo: Option<bool>,
}

impl Searchable for Client {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.nombre.as_str()),
            self.nit.as_deref(),
            self.email.as_deref(),
            self.ciudad.as_deref(),
            self.contacto.as_deref(),
        ]
    }
}

impl Client {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>("SELECT * FROM clientes WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM clientes WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &ClientFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .raw("deleted_at IS NULL")
            .search(filters.search.as_deref())
            .eq("ciudad", filters.ciudad.as_ref())
            .eq("activo", filters.activo);
        fetch_page(pool, "clientes", &filters, NEWEST_FIRST, page).await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateClient,
        client_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let query = sqlx::query_as::<_, Client>(
            r#"INSERT INTO clientes (id, nombre, nit, email, telefono, direccion, ciudad, contacto, activo)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(client_id)
        .bind(&data.nombre)
        .bind(&data.nit)
        .bind(&data.email)
        .bind(&data.telefono)
        .bind(&data.direccion)
        .bind(&data.ciudad)
        .bind(&data.contacto)
        .bind(data.activo.unwrap_or(true));
        fetch_indexed(pool, "clientes", client_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Applies the fields present in `data`. Returns `None` when the client
    /// does not exist; an empty payload leaves the row untouched.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateClient,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("clientes");
        set.set("nombre", data.nombre.clone())
            .set("nit", data.nit.clone())
            .set("email", data.email.clone())
            .set("telefono", data.telefono.clone())
            .set("direccion", data.direccion.clone())
            .set("ciudad", data.ciudad.clone())
            .set("contacto", data.contacto.clone())
            .set("activo", data.activo);

        match set.finish(id, Some("deleted_at IS NULL")) {
            Some(mut qb) => {
                fetch_indexed(pool, "clientes", id, qb.build_query_as::<Client>()).await
            }
            None => Self::find_by_id(pool, id).await,
        }
    }

    pub async fn soft_delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE clientes SET deleted_at = datetime('now', 'subsec') WHERE id = $1 AND deleted_at IS NULL",
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
    use crate::DBService;

    async fn create_named(pool: &SqlitePool, nombre: &str) -> Client {
        Client::create(pool, &CreateClient::named(nombre), Uuid::new_v4())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_find_returns_submitted_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let data = CreateClient {
            nit: Some("900123456-1".to_string()),
            email: Some("contacto@acme.co".to_string()),
            ciudad: Some("Bogotá".to_string()),
            ..CreateClient::named("Acme")
        };
        let id = Uuid::new_v4();
        let created = Client::create(&db.pool, &data, id).await.unwrap();
        assert_eq!(created.id, id);

        let found = Client::find_by_id(&db.pool, id).await.unwrap().unwrap();
        assert_eq!(found.nombre, "Acme");
        assert_eq!(found.nit.as_deref(), Some("900123456-1"));
        assert_eq!(found.email.as_deref(), Some("contacto@acme.co"));
        assert_eq!(found.ciudad.as_deref(), Some("Bogotá"));
        assert!(found.activo);
    }

    #[tokio::test]
    async fn update_changes_only_present_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let client = create_named(&db.pool, "Acme").await;

        let updated = Client::update(
            &db.pool,
            client.id,
            &UpdateClient {
                ciudad: Some("Medellín".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.nombre, "Acme");
        assert_eq!(updated.ciudad.as_deref(), Some("Medellín"));
    }

    #[tokio::test]
    async fn empty_update_does_not_mutate() {
        let db = DBService::new_in_memory().await.unwrap();
        let client = create_named(&db.pool, "Acme").await;

        let same = Client::update(&db.pool, client.id, &UpdateClient::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same.updated_at, client.updated_at);
        assert_eq!(same.nombre, client.nombre);
    }

    #[tokio::test]
    async fn soft_deleted_client_is_hidden() {
        let db = DBService::new_in_memory().await.unwrap();
        let client = create_named(&db.pool, "Acme").await;

        assert_eq!(Client::soft_delete(&db.pool, client.id).await.unwrap(), 1);
        assert!(Client::find_by_id(&db.pool, client.id).await.unwrap().is_none());
        assert!(!Client::exists(&db.pool, client.id).await.unwrap());
        assert_eq!(Client::soft_delete(&db.pool, client.id).await.unwrap(), 0);

        let page = Client::list(&db.pool, &ClientFilters::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 0);

        let updated = Client::update(
            &db.pool,
            client.id,
            &UpdateClient {
                nombre: Some("Ghost".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn search_is_case_insensitive() {
        let db = DBService::new_in_memory().await.unwrap();
        create_named(&db.pool, "Clínica Dental Sonrisa").await;
        create_named(&db.pool, "Odontología Integral").await;
        create_named(&db.pool, "DENTAL PLUS").await;

        let filters = ClientFilters {
            search: Some("dental".to_string()),
            ..Default::default()
        };
        let page = Client::list(&db.pool, &filters, &PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.pagination.total, 2);
        assert!(
            page.items
                .iter()
                .all(|c| c.nombre.to_lowercase().contains("dental"))
        );
    }

    #[tokio::test]
    async fn search_folds_accented_capitals() {
        let db = DBService::new_in_memory().await.unwrap();
        let client = create_named(&db.pool, "CLÍNICA ÑUÑOA").await;
        create_named(&db.pool, "Consultorio Central").await;

        let search = |term: &str| ClientFilters {
            search: Some(term.to_string()),
            ..Default::default()
        };
        for term in ["clínica ñuñoa", "CLÍNICA", "Ñuñoa"] {
            let page = Client::list(&db.pool, &search(term), &PageRequest::default())
                .await
                .unwrap();
            assert_eq!(page.pagination.total, 1, "{term}");
            assert_eq!(page.items[0].id, client.id);
        }

        Client::update(
            &db.pool,
            client.id,
            &UpdateClient {
                nombre: Some("ÓPTICA ÁVILA".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let renamed = Client::list(&db.pool, &search("óptica"), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(renamed.pagination.total, 1);
        let stale = Client::list(&db.pool, &search("ñuñoa"), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(stale.pagination.total, 0);
    }

    #[tokio::test]
    async fn list_paginates_with_matching_count() {
        let db = DBService::new_in_memory().await.unwrap();
        for i in 0..7 {
            create_named(&db.pool, &format!("Cliente {i}")).await;
        }

        let page = Client::list(&db.pool, &ClientFilters::default(), &PageRequest::new(2, 3))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.pagination.total, 7);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next);

        let last = Client::list(&db.pool, &ClientFilters::default(), &PageRequest::new(3, 3))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.pagination.has_next);
    }
}
