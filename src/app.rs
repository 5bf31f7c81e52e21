use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::auth::JwtSessionResolver;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, EtablissementStore, InMemoryEtablissementStore, PgEtablissementStore};
use crate::handlers;
use crate::middleware::{tenant_router_middleware, TenantRouter};
use crate::tenant::{HttpTenantLookup, TenantCache, TenantValidator};

/// Shared state for application handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EtablissementStore>,
    pub database: Option<DatabaseManager>,
}

impl AppState {
    pub fn new(store: Arc<dyn EtablissementStore>) -> Self {
        Self { store, database: None }
    }

    /// Postgres-backed state, or an empty in-memory store when no database is
    /// configured
    pub fn from_config(config: &AppConfig) -> Self {
        match DatabaseManager::connect_lazy(&config.database) {
            Ok(database) => Self {
                store: Arc::new(PgEtablissementStore::new(database.pool().clone())),
                database: Some(database),
            },
            Err(e) => {
                tracing::warn!("Database unavailable ({}), serving an empty établissement store", e);
                Self::new(Arc::new(InMemoryEtablissementStore::new()))
            }
        }
    }
}

/// Tenant router wired from configuration: HTTP lookup against the
/// validation endpoint, process-wide verdict cache, JWT cookie sessions.
pub fn tenant_router_from_config(config: &AppConfig) -> anyhow::Result<TenantRouter> {
    let lookup = HttpTenantLookup::new(&config.tenancy.validation_url, config.validation_timeout())?;
    let cache = Arc::new(TenantCache::new(config.cache_ttl(), config.tenancy.cache_max_entries));
    let validator = TenantValidator::new(cache, Arc::new(lookup)).with_timeout(config.validation_timeout());
    let sessions = JwtSessionResolver::new(&config.security.jwt_secret, &config.security.session_cookie);

    Ok(TenantRouter::new(
        config.tenancy_settings(),
        Arc::new(validator),
        Arc::new(sessions),
    ))
}

/// Application routes, without the tenant router
pub fn routes(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Tenant lookup protocol
        .route("/api/etablissements/validate", get(handlers::validate_get))
        // Tenant-scoped namespace, reached through rewrites
        .route("/etablissements/:subdomain", get(handlers::tenant_home))
        .route("/etablissements/:subdomain/*rest", get(handlers::tenant_page))
        .with_state(state)
}

/// Full application. The tenant router runs on an outer router whose only
/// route is the fallback, so its URI rewrites reach the inner route matching.
pub fn app(state: AppState, tenant_router: TenantRouter) -> Router {
    Router::new()
        .fallback_service(routes(state))
        .layer(middleware::from_fn_with_state(tenant_router, tenant_router_middleware))
        .layer(TraceLayer::new_for_http())
}
