// handlers/public/mod.rs - Public handlers (no session, no tenant context)
//
// Route Prefix: / and /health
// Middleware: tenant router only (both paths are public on the main domain)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Classio",
            "version": version,
            "description": "Multi-tenant school management platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health",
                "validate": "/api/etablissements/validate?subdomain=<name> (tenant lookup)",
                "tenant": "/etablissements/:subdomain[/*page] (reached through <subdomain>.<main domain>)",
            }
        }
    }))
}

/// GET /health - database liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(database) = state.database.as_ref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database not configured",
                "data": { "status": "degraded", "timestamp": now }
            })),
        );
    };

    match database.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
