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
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Alerta,
    Orden,
    Bodega,
}

/// Per-user inbox entry. Deleted physically.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Notification {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub titulo: String,
    pub mensaje: String,
    pub tipo: NotificationKind,
    pub leida: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, Validate)]
pub struct CreateNotification {
    pub usuario_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub titulo: String,
    #[validate(length(min = 1, max = 2000))]
    pub mensaje: String,
    pub tipo: Option<NotificationKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, Validate)]
pub struct UpdateNotification {
    #[validate(length(min = 1, max = 200))]
    pub titulo: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub mensaje: Option<String>,
    pub tipo: Option<NotificationKind>,
    pub leida: Option<bool>,
}

impl UpdateNotification {
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none() && self.mensaje.is_none() && self.tipo.is_none() && self.leida.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct NotificationFilters {
    pub search: Option<String>,
    pub leida: Option<bool>,
    pub tipo: Option<NotificationKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct MarkedRead {
    pub updated: u64,
}

impl Searchable for Notification {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            Some(self.titulo.as_str()),
            Some(self.mensaje.as_str()),
        ]
    }
}

impl Notification {
    /// Every lookup is scoped to the owner so users cannot read each other's inbox.
    pub async fn find_for_user(
        pool: &SqlitePool,
        id: Uuid,
        usuario_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notificaciones WHERE id = $1 AND usuario_id = $2",
        )
        .bind(id)
        .bind(usuario_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        usuario_id: Uuid,
        filters: &NotificationFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .eq("usuario_id", Some(usuario_id))
            .search(filters.search.as_deref())
            .eq("leida", filters.leida)
            .eq("tipo", filters.tipo.map(|t| t.to_string()));
        fetch_page(pool, "notificaciones", &filters, NEWEST_FIRST, page).await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateNotification,
        notification_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let query = sqlx::query_as::<_, Notification>(
            r#"INSERT INTO notificaciones (id, usuario_id, titulo, mensaje, tipo)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(notification_id)
        .bind(data.usuario_id)
        .bind(&data.titulo)
        .bind(&data.mensaje)
        .bind(data.tipo.unwrap_or_default());
        fetch_indexed(pool, "notificaciones", notification_id, query)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update_for_user(
        pool: &SqlitePool,
        id: Uuid,
        usuario_id: Uuid,
        data: &UpdateNotification,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("notificaciones").without_timestamp();
        set.set("titulo", data.titulo.clone())
            .set("mensaje", data.mensaje.clone())
            .set("tipo", data.tipo)
            .set("leida", data.leida);

        set.scope_eq("usuario_id", usuario_id);

        match set.finish(id, None) {
            Some(mut qb) => {
                fetch_indexed(pool, "notificaciones", id, qb.build_query_as::<Notification>()).await
            }
            None => Self::find_for_user(pool, id, usuario_id).await,
        }
    }

    pub async fn mark_read(
        pool: &SqlitePool,
        id: Uuid,
        usuario_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notificaciones SET leida = 1 WHERE id = $1 AND usuario_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(usuario_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn mark_all_read(pool: &SqlitePool, usuario_id: Uuid) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE notificaciones SET leida = 1 WHERE usuario_id = $1 AND leida = 0")
                .bind(usuario_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(pool: &SqlitePool, usuario_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notificaciones WHERE usuario_id = $1 AND leida = 0",
        )
        .bind(usuario_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete_for_user(
        pool: &SqlitePool,
        id: Uuid,
        usuario_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notificaciones WHERE id = $1 AND usuario_id = $2")
            .bind(id)
            .bind(usuario_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DBService, models::user::tests::seed_user};

    fn notification_for(usuario_id: Uuid, titulo: &str) -> CreateNotification {
        CreateNotification {
            usuario_id,
            titulo: titulo.to_string(),
            mensaje: "Revisar detalle".to_string(),
            tipo: None,
        }
    }

    #[tokio::test]
    async fn inbox_is_scoped_to_owner() {
        let db = DBService::new_in_memory().await.unwrap();
        let ana = seed_user(&db.pool, "ana@clinica.co").await;
        let luis = seed_user(&db.pool, "luis@clinica.co").await;

        let note = Notification::create(&db.pool, &notification_for(ana.id, "Orden asignada"), Uuid::new_v4())
            .await
            .unwrap();
        Notification::create(&db.pool, &notification_for(luis.id, "Otra"), Uuid::new_v4())
            .await
            .unwrap();

        assert!(Notification::find_for_user(&db.pool, note.id, luis.id).await.unwrap().is_none());
        assert_eq!(Notification::delete_for_user(&db.pool, note.id, luis.id).await.unwrap(), 0);

        let page = Notification::list_for_user(&db.pool, ana.id, &NotificationFilters::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].titulo, "Orden asignada");
    }

    #[tokio::test]
    async fn update_only_touches_owned_rows() {
        let db = DBService::new_in_memory().await.unwrap();
        let ana = seed_user(&db.pool, "ana@clinica.co").await;
        let luis = seed_user(&db.pool, "luis@clinica.co").await;
        let note = Notification::create(&db.pool, &notification_for(ana.id, "Orden asignada"), Uuid::new_v4())
            .await
            .unwrap();

        let retitle = UpdateNotification {
            titulo: Some("ÓRDEN REPROGRAMADA".to_string()),
            ..Default::default()
        };
        assert!(
            Notification::update_for_user(&db.pool, note.id, luis.id, &retitle)
                .await
                .unwrap()
                .is_none()
        );
        let unchanged = Notification::find_for_user(&db.pool, note.id, ana.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.titulo, "Orden asignada");

        let updated = Notification::update_for_user(&db.pool, note.id, ana.id, &retitle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.titulo, "ÓRDEN REPROGRAMADA");

        let filters = NotificationFilters {
            search: Some("órden reprogramada".to_string()),
            ..Default::default()
        };
        let page = Notification::list_for_user(&db.pool, ana.id, &filters, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 1);
    }

    #[tokio::test]
    async fn mark_read_updates_unread_count() {
        let db = DBService::new_in_memory().await.unwrap();
        let ana = seed_user(&db.pool, "ana@clinica.co").await;
        let first = Notification::create(&db.pool, &notification_for(ana.id, "Uno"), Uuid::new_v4())
            .await
            .unwrap();
        for titulo in ["Dos", "Tres"] {
            Notification::create(&db.pool, &notification_for(ana.id, titulo), Uuid::new_v4())
                .await
                .unwrap();
        }
        assert_eq!(Notification::unread_count(&db.pool, ana.id).await.unwrap(), 3);

        let read = Notification::mark_read(&db.pool, first.id, ana.id)
            .await
            .unwrap()
            .unwrap();
        assert!(read.leida);
        assert_eq!(Notification::unread_count(&db.pool, ana.id).await.unwrap(), 2);

        assert_eq!(Notification::mark_all_read(&db.pool, ana.id).await.unwrap(), 2);
        assert_eq!(Notification::unread_count(&db.pool, ana.id).await.unwrap(), 0);

        let unread = Notification::list_for_user(
            &db.pool,
            ana.id,
            &NotificationFilters {
                leida: Some(false),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
        assert!(unread.items.is_empty());
    }
}
