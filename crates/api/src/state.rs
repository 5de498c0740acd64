//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::db::{Gateway, PgGateway};
use crate::services::{AuthService, RatingService, StoreService, UserService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the gateway, services, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    auth: AuthService,
    ratings: RatingService,
    stores: StoreService,
    users: UserService,
}

impl AppState {
    /// Create a new application state backed by Postgres.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let gateway: Arc<dyn Gateway> = Arc::new(PgGateway::new(pool.clone()));
        Self::with_gateway(config, pool, gateway)
    }

    /// Create a state over an arbitrary gateway (used by tests).
    #[must_use]
    pub fn with_gateway(config: ApiConfig, pool: PgPool, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                auth: AuthService::new(Arc::clone(&gateway)),
                ratings: RatingService::new(Arc::clone(&gateway)),
                stores: StoreService::new(Arc::clone(&gateway)),
                users: UserService::new(gateway),
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the rating service.
    #[must_use]
    pub fn ratings(&self) -> &RatingService {
        &self.inner.ratings
    }

    /// Get a reference to the store service.
    #[must_use]
    pub fn stores(&self) -> &StoreService {
        &self.inner.stores
    }

    /// Get a reference to the user administration service.
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.inner.users
    }
}
