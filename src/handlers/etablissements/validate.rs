// handlers/etablissements/validate.rs - GET /api/etablissements/validate handler

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::tenant::LookupResponse;

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub subdomain: Option<String>,
}

/// GET /api/etablissements/validate?subdomain=<candidate>
///
/// Server side of the tenant lookup used by the tenant router. Answers
/// `{ "valid": false }` for unknown subdomains and
/// `{ "valid": true, "etablissementId": "...", "etablissementNom": "..." }`
/// for known ones. Any non-2xx answer makes the router fail open.
pub async fn validate_get(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> Result<Json<LookupResponse>, ApiError> {
    let subdomain = query
        .subdomain
        .as_deref()
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter 'subdomain' is required"))?;

    let found = state.store.find_by_subdomain(&subdomain).await?;

    let response = match found {
        Some(etablissement) => {
            tracing::debug!("Subdomain '{}' belongs to établissement {}", subdomain, etablissement.id);
            LookupResponse::valid(etablissement.id, etablissement.nom)
        }
        None => {
            tracing::debug!("Subdomain '{}' matches no établissement", subdomain);
            LookupResponse::invalid()
        }
    };

    Ok(Json(response))
}
