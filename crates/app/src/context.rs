//! Application context
//!
//! Owns the database, the token manager, the vendor gateway and the batch
//! services built on top of them. Every command runs against one context.

use std::sync::Arc;

use suitelink_common::auth::{OAuthClient, OAuthConfig};
use suitelink_core::{AuthManager, EntitySyncService, MirrorStore, ReorderLevelEngine, VendorApi};
use suitelink_domain::{Config, Result};
use suitelink_infra::{
    ApiGateway, DbManager, SqliteItemRepository, SqliteMirrorStore, SqliteSalesHistoryRepository,
    SqliteTokenRepository,
};
use tracing::info;

/// Shared services for one process
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub auth: Arc<AuthManager>,
    pub gateway: Arc<ApiGateway>,
    pub reorder: ReorderLevelEngine,
    pub mirror: Arc<SqliteMirrorStore>,
}

impl AppContext {
    /// Open the database, apply migrations and wire the services.
    ///
    /// # Errors
    /// Fails when the database cannot be opened or migrated, or when the
    /// gateway or reorder configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let vendor = &config.vendor;
        let oauth = OAuthClient::new(OAuthConfig::new(
            vendor.accounts_url.clone(),
            vendor.client_id.clone(),
            vendor.client_secret.clone(),
            vendor.redirect_uri.clone(),
        ));
        let tokens = Arc::new(SqliteTokenRepository::new(Arc::clone(&db)));
        let auth = Arc::new(AuthManager::new(tokens, Arc::new(oauth)));

        let gateway = Arc::new(ApiGateway::from_config(&config, Arc::clone(&auth))?);

        let reorder = ReorderLevelEngine::new(
            Arc::new(SqliteSalesHistoryRepository::new(Arc::clone(&db))),
            Arc::new(SqliteItemRepository::new(Arc::clone(&db))),
            config.reorder.clone(),
        )?;
        let mirror = Arc::new(SqliteMirrorStore::new(Arc::clone(&db)));

        info!(database = %db.path().display(), "Application context ready");

        Ok(Self { config, db, auth, gateway, reorder, mirror })
    }

    /// Entity sync service over this context's gateway and mirror.
    pub fn sync_service(&self) -> EntitySyncService {
        let api: Arc<dyn VendorApi> = self.gateway.clone();
        let store: Arc<dyn MirrorStore> = self.mirror.clone();
        EntitySyncService::new(api, store)
    }
}
