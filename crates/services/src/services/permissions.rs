//! Role-based access checks backed by the `permisos` table.

use db::models::{
    permission::{Action, AppModule, Permission},
    user::UserRole,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use strum::IntoEnumIterator;
use tracing::debug;
use ts_rs::TS;

/// Effective access of one role on one module. Modules without a row grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ModuleAccess {
    pub modulo: AppModule,
    pub puede_ver: bool,
    pub puede_crear: bool,
    pub puede_editar: bool,
    pub puede_eliminar: bool,
}

impl ModuleAccess {
    fn full(modulo: AppModule) -> Self {
        Self {
            modulo,
            puede_ver: true,
            puede_crear: true,
            puede_editar: true,
            puede_eliminar: true,
        }
    }

    fn none(modulo: AppModule) -> Self {
        Self {
            modulo,
            puede_ver: false,
            puede_crear: false,
            puede_editar: false,
            puede_eliminar: false,
        }
    }
}

impl From<&Permission> for ModuleAccess {
    fn from(p: &Permission) -> Self {
        Self {
            modulo: p.modulo,
            puede_ver: p.puede_ver,
            puede_crear: p.puede_crear,
            puede_editar: p.puede_editar,
            puede_eliminar: p.puede_eliminar,
        }
    }
}

pub async fn is_allowed(
    pool: &SqlitePool,
    rol: UserRole,
    modulo: AppModule,
    action: Action,
) -> Result<bool, sqlx::Error> {
    if rol == UserRole::Admin {
        return Ok(true);
    }
    let allowed = Permission::find_for(pool, rol, modulo)
        .await?
        .is_some_and(|p| p.allows(action));
    if !allowed {
        debug!(rol = %rol, modulo = %modulo, action = %action, "Permission denied");
    }
    Ok(allowed)
}

/// One entry per module, in declaration order.
pub async fn access_matrix(pool: &SqlitePool, rol: UserRole) -> Result<Vec<ModuleAccess>, sqlx::Error> {
    if rol == UserRole::Admin {
        return Ok(AppModule::iter().map(ModuleAccess::full).collect());
    }
    let grants = Permission::find_by_role(pool, rol).await?;
    Ok(AppModule::iter()
        .map(|modulo| {
            grants
                .iter()
                .find(|p| p.modulo == modulo)
                .map(ModuleAccess::from)
                .unwrap_or_else(|| ModuleAccess::none(modulo))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use db::DBService;

    use super::*;

    #[tokio::test]
    async fn admin_bypasses_table() {
        let db = DBService::new_in_memory().await.unwrap();
        sqlx::query("DELETE FROM permisos").execute(&db.pool).await.unwrap();

        assert!(is_allowed(&db.pool, UserRole::Admin, AppModule::Permisos, Action::Eliminar)
            .await
            .unwrap());
        assert!(!is_allowed(&db.pool, UserRole::Coordinador, AppModule::Clientes, Action::Ver)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn seeded_grants_apply_per_action() {
        let db = DBService::new_in_memory().await.unwrap();
        assert!(is_allowed(&db.pool, UserRole::Tecnico, AppModule::Ordenes, Action::Editar)
            .await
            .unwrap());
        assert!(!is_allowed(&db.pool, UserRole::Tecnico, AppModule::Ordenes, Action::Eliminar)
            .await
            .unwrap());
        assert!(!is_allowed(&db.pool, UserRole::Bodega, AppModule::Clientes, Action::Ver)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn matrix_covers_every_module() {
        let db = DBService::new_in_memory().await.unwrap();
        let bodega = access_matrix(&db.pool, UserRole::Bodega).await.unwrap();
        assert_eq!(bodega.len(), AppModule::iter().count());

        let warehouse = bodega
            .iter()
            .find(|a| a.modulo == AppModule::SolicitudesBodega)
            .unwrap();
        assert!(warehouse.puede_ver && warehouse.puede_editar && !warehouse.puede_eliminar);
        let clients = bodega.iter().find(|a| a.modulo == AppModule::Clientes).unwrap();
        assert_eq!(clients, &ModuleAccess::none(AppModule::Clientes));

        let admin = access_matrix(&db.pool, UserRole::Admin).await.unwrap();
        assert!(admin.iter().all(|a| a.puede_eliminar));
    }
}
