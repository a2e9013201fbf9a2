//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::CacheStore;
use crate::config::StorefrontConfig;
use crate::services::auth::JwtKeys;
use crate::services::catalog::CatalogService;
use crate::services::delivery::DeliveryClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    cache: CacheStore,
    catalog: CatalogService,
    delivery: DeliveryClient,
    jwt: JwtKeys,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, cache: CacheStore) -> Self {
        let catalog = CatalogService::new(pool.clone(), config.catalog_cache_ttl);
        let delivery = DeliveryClient::new(config.delivery_api_url.clone());
        let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                cache,
                catalog,
                delivery,
                jwt,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Cart and user-details cache.
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn delivery(&self) -> &DeliveryClient {
        &self.inner.delivery
    }

    /// Token signing keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }
}
