use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumIter, EnumString};
use ts_rs::TS;
use utils::pagination::{Page, PageRequest};
use uuid::Uuid;

use super::user::UserRole;
use crate::query::{Assignments, Filters, fetch_page};

/// Back-office areas that permissions are granted on.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, EnumIter, Display,
)]
#[sqlx(type_name = "app_module", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AppModule {
    Clientes,
    Sedes,
    Equipos,
    Tecnicos,
    Solicitudes,
    Ordenes,
    SolicitudesBodega,
    Notificaciones,
    Permisos,
    Usuarios,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Ver,
    Crear,
    Editar,
    Eliminar,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Permission {
    pub id: Uuid,
    pub rol: UserRole,
    pub modulo: AppModule,
    pub puede_ver: bool,
    pub puede_crear: bool,
    pub puede_editar: bool,
    pub puede_eliminar: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Ver => self.puede_ver,
            Action::Crear => self.puede_crear,
            Action::Editar => self.puede_editar,
            Action::Eliminar => self.puede_eliminar,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePermission {
    pub rol: UserRole,
    pub modulo: AppModule,
    #[serde(default)]
    pub puede_ver: bool,
    #[serde(default)]
    pub puede_crear: bool,
    #[serde(default)]
    pub puede_editar: bool,
    #[serde(default)]
    pub puede_eliminar: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdatePermission {
    pub puede_ver: Option<bool>,
    pub puede_crear: Option<bool>,
    pub puede_editar: Option<bool>,
    pub puede_eliminar: Option<bool>,
}

impl UpdatePermission {
    pub fn is_empty(&self) -> bool {
        self.puede_ver.is_none()
            && self.puede_crear.is_none()
            && self.puede_editar.is_none()
            && self.puede_eliminar.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct PermissionFilters {
    pub rol: Option<UserRole>,
    pub modulo: Option<AppModule>,
}

impl Permission {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permisos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_for(
        pool: &SqlitePool,
        rol: UserRole,
        modulo: AppModule,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permisos WHERE rol = $1 AND modulo = $2")
            .bind(rol)
            .bind(modulo)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_role(pool: &SqlitePool, rol: UserRole) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permisos WHERE rol = $1 ORDER BY modulo ASC")
            .bind(rol)
            .fetch_all(pool)
            .await
    }

    pub async fn list(
        pool: &SqlitePool,
        filters: &PermissionFilters,
        page: &PageRequest,
    ) -> Result<Page<Self>, sqlx::Error> {
        let filters = Filters::new()
            .eq("rol", filters.rol.map(|r| r.to_string()))
            .eq("modulo", filters.modulo.map(|m| m.to_string()));
        fetch_page(pool, "permisos", &filters, "rol ASC, modulo ASC", page).await
    }

    /// Fails with a unique violation when the (rol, modulo) pair already exists.
    pub async fn create(
        pool: &SqlitePool,
        data: &CreatePermission,
        permission_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Permission>(
            r#"INSERT INTO permisos (id, rol, modulo, puede_ver, puede_crear, puede_editar, puede_eliminar)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(permission_id)
        .bind(data.rol)
        .bind(data.modulo)
        .bind(data.puede_ver)
        .bind(data.puede_crear)
        .bind(data.puede_editar)
        .bind(data.puede_eliminar)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdatePermission,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut set = Assignments::new("permisos");
        set.set("puede_ver", data.puede_ver)
            .set("puede_crear", data.puede_crear)
            .set("puede_editar", data.puede_editar)
            .set("puede_eliminar", data.puede_eliminar);

        match set.finish(id, None) {
            Some(mut qb) => qb.build_query_as::<Permission>().fetch_optional(pool).await,
            None => Self::find_by_id(pool, id).await,
        }
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM permisos WHERE id = $1")
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

    fn grant(rol: UserRole, modulo: AppModule) -> CreatePermission {
        CreatePermission {
            rol,
            modulo,
            puede_ver: true,
            puede_crear: false,
            puede_editar: false,
            puede_eliminar: false,
        }
    }

    #[tokio::test]
    async fn role_module_pair_is_unique() {
        let db = DBService::new_in_memory().await.unwrap();
        // Wipe the default grants so the test controls the table.
        sqlx::query("DELETE FROM permisos").execute(&db.pool).await.unwrap();

        Permission::create(&db.pool, &grant(UserRole::Bodega, AppModule::Equipos), Uuid::new_v4())
            .await
            .unwrap();
        let duplicate =
            Permission::create(&db.pool, &grant(UserRole::Bodega, AppModule::Equipos), Uuid::new_v4()).await;
        match duplicate {
            Err(sqlx::Error::Database(e)) => assert!(e.is_unique_violation()),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_toggles_single_flag() {
        let db = DBService::new_in_memory().await.unwrap();
        sqlx::query("DELETE FROM permisos").execute(&db.pool).await.unwrap();
        let created =
            Permission::create(&db.pool, &grant(UserRole::Tecnico, AppModule::Ordenes), Uuid::new_v4())
                .await
                .unwrap();
        assert!(!created.allows(Action::Editar));

        let updated = Permission::update(
            &db.pool,
            created.id,
            &UpdatePermission {
                puede_editar: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert!(updated.allows(Action::Ver));
        assert!(updated.allows(Action::Editar));
        assert!(!updated.allows(Action::Eliminar));

        let found = Permission::find_for(&db.pool, UserRole::Tecnico, AppModule::Ordenes)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn default_grants_are_seeded() {
        let db = DBService::new_in_memory().await.unwrap();
        let tecnico = Permission::find_by_role(&db.pool, UserRole::Tecnico).await.unwrap();
        let ordenes = tecnico
            .iter()
            .find(|p| p.modulo == AppModule::Ordenes)
            .expect("tecnico has an ordenes grant");
        assert!(ordenes.allows(Action::Ver));
        assert!(ordenes.allows(Action::Editar));
        assert!(!ordenes.allows(Action::Eliminar));
        assert!(Permission::find_by_role(&db.pool, UserRole::Admin).await.unwrap().is_empty());
    }
}
