use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// Login session. Only the SHA-256 of the refresh token is stored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub usuario_id: Uuid,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    pub async fn create(
        pool: &SqlitePool,
        session_id: Uuid,
        usuario_id: Uuid,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"INSERT INTO sesiones (id, usuario_id, refresh_token_hash, expires_at)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(session_id)
        .bind(usuario_id)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Session>("SELECT * FROM sesiones WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_refresh_hash(
        pool: &SqlitePool,
        refresh_token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Session>("SELECT * FROM sesiones WHERE refresh_token_hash = $1")
            .bind(refresh_token_hash)
            .fetch_optional(pool)
            .await
    }

    pub async fn revoke(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sesiones SET revoked_at = datetime('now', 'subsec') WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Closes every open session of a user, e.g. on deactivation.
    pub async fn revoke_all_for_user(pool: &SqlitePool, usuario_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sesiones SET revoked_at = datetime('now', 'subsec') WHERE usuario_id = $1 AND revoked_at IS NULL",
        )
        .bind(usuario_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::{DBService, models::user::tests::seed_user};

    #[tokio::test]
    async fn revoked_session_is_inactive() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = seed_user(&db.pool, "jefe@clinica.co").await;
        let expires_at = Utc::now() + Duration::days(7);

        let session = Session::create(&db.pool, Uuid::new_v4(), user.id, "abc123", expires_at)
            .await
            .unwrap();
        assert!(session.is_active(Utc::now()));
        assert!(!session.is_active(expires_at + Duration::seconds(1)));

        assert_eq!(Session::revoke(&db.pool, session.id).await.unwrap(), 1);
        let reloaded = Session::find_by_refresh_hash(&db.pool, "abc123")
            .await
            .unwrap()
            .unwrap();
        assert!(!reloaded.is_active(Utc::now()));
    }

    #[tokio::test]
    async fn revoke_all_closes_only_that_users_sessions() {
        let db = DBService::new_in_memory().await.unwrap();
        let ana = seed_user(&db.pool, "ana@clinica.co").await;
        let luis = seed_user(&db.pool, "luis@clinica.co").await;
        let expires_at = Utc::now() + Duration::days(7);
        for hash in ["a1", "a2"] {
            Session::create(&db.pool, Uuid::new_v4(), ana.id, hash, expires_at)
                .await
                .unwrap();
        }
        let other = Session::create(&db.pool, Uuid::new_v4(), luis.id, "l1", expires_at)
            .await
            .unwrap();

        assert_eq!(Session::revoke_all_for_user(&db.pool, ana.id).await.unwrap(), 2);
        assert_eq!(Session::revoke_all_for_user(&db.pool, ana.id).await.unwrap(), 0);
        let other = Session::find_by_id(&db.pool, other.id).await.unwrap().unwrap();
        assert!(other.is_active(Utc::now()));
    }
}
