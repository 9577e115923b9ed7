use std::sync::Arc;

use storefront_cache::{CacheConfig, CacheLayer};
use storefront_config::{CorsConfig, SecretsConfig};
use storefront_db::{database_url_from_env, init_db_pool, run_migrations};
use tracing::{info, warn};

use crate::catalog::{Catalog, InMemoryCatalog, PgCatalog};

#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: CacheLayer,
    pub catalog: Arc<dyn Catalog>,
    pub secrets: SecretsConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    pub fn new(cache: CacheLayer, catalog: Arc<dyn Catalog>, secrets: SecretsConfig) -> Self {
        Self {
            cache,
            catalog,
            secrets,
            cors_config: CorsConfig::default(),
        }
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let cache = CacheLayer::connect(&CacheConfig::from_env()).await?;

    let catalog: Arc<dyn Catalog> = match database_url_from_env() {
        Some(url) => {
            let pool = init_db_pool(&url).await?;
            run_migrations(&pool).await?;
            info!("Using PostgreSQL catalog");
            Arc::new(PgCatalog::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, serving the in-memory demo catalog");
            Arc::new(InMemoryCatalog::seeded())
        }
    };

    Ok(AppState {
        cache,
        catalog,
        secrets: SecretsConfig::from_env(),
        cors_config: CorsConfig::from_env(),
    })
}
