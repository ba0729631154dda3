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
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    Admin,
    Coordinador,
    #[default]
    Tecnico,
    Bodega,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub nombre: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub rol: UserRole,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub nombre: String,
    pub password_hash: String,
    pub rol: UserRole,
}

/// Columns to change; `password_hash` is already hashed.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub nombre: Option<String>,
    pub password_hash: Option<String>,
    pub rol: Option<UserRole>,
    pub activo: Option<bool>,
}

/// Body of `POST /usuarios`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub nombre: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub rol: Option<UserRole>,
}

/// Body of `PUT /usuarios/{id}`. `activo: true` reactivates a deactivated user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub nombre: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub rol: Option<UserRole>,
    pub activo: Option<bool>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.nombre.is_none()
            && self.password.is_none()
            && self.rol.is_none()
            && self.activo.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UserFilters {
    pub search: Option<String>,
    pub rol: Option<UserRole>,
    /// Defaults to active users only.
    pub activo: Option<bool>,
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![Some(self.nombre.as_str()), Some(self.email.as_str())]
    }
}

impl User {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM usuarios WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &UserFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .eq("activo", Some(filters.activo.unwrap_or(true)))
            .search(filters.search.as_deref())
            .eq("rol", filters.rol.map(|r| r.to_string()));
        fetch_page(pool, "usuarios", &filters, NEWEST_FIRST, page).await
    }

    /// Email comparison is case-insensitive (column collation).
    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM usuarios WHERE email = $1")
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateUser, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let query = sqlx::query_as::<_, User>(
            r#"INSERT INTO usuarios (id, email, nombre, password_hash, rol)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(user_id)
        .bind(data.email.trim())
        .bind(&data.nombre)
        .bind(&data.password_hash)
        .bind(data.rol);
        fetch_indexed(pool, "usuarios", user_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Not scoped to active users: `find_by_id` still returns deactivated ones.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("usuarios");
        set.set("email", data.email.as_deref().map(|e| e.trim().to_string()))
            .set("nombre", data.nombre.clone())
            .set("password_hash", data.password_hash.clone())
            .set("rol", data.rol)
            .set("activo", data.activo);

        match set.finish(id, None) {
            Some(mut qb) => fetch_indexed(pool, "usuarios", id, qb.build_query_as::<User>()).await,
            None => Self::find_by_id(pool, id).await,
        }
    }

    /// Soft delete: flips `activo` off.
    pub async fn deactivate(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE usuarios SET activo = 0, updated_at = datetime('now', 'subsec') WHERE id = $1 AND activo = 1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
