// handlers/etablissements/tenant.rs - GET /etablissements/:subdomain[/*rest] handlers
//
// Rewritten tenant requests land here. Pages are rendered elsewhere; these
// handlers expose the tenant context the router attached.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    Extension,
};
use serde::Serialize;

use crate::auth::{Session, SessionUser};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::tenant::{
    TenantContext, ETABLISSEMENT_ID_HEADER, ETABLISSEMENT_ID_PARAM, ETABLISSEMENT_NOM_HEADER, ETABLISSEMENT_NOM_PARAM,
};

/// Tenant identity of the current request.
///
/// Read from the router's `TenantContext` extension, then from the
/// `etablissementId` / `etablissementNom` query parameters, then from the
/// `x-etablissement-*` headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantParams {
    pub subdomain: Option<String>,
    pub etablissement_id: String,
    pub etablissement_nom: Option<String>,
}

impl From<TenantContext> for TenantParams {
    fn from(context: TenantContext) -> Self {
        Self {
            subdomain: Some(context.subdomain),
            etablissement_id: context.identity.id,
            etablissement_nom: Some(context.identity.nom),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<TenantContext>() {
            return Ok(context.clone().into());
        }

        if let Some(params) = from_query(parts.uri.query()) {
            return Ok(params);
        }

        if let Some(params) = from_headers(parts) {
            return Ok(params);
        }

        Err(ApiError::not_found("No établissement context for this request"))
    }
}

fn from_query(query: Option<&str>) -> Option<TenantParams> {
    let mut id = None;
    let mut nom = None;
    for (key, value) in url::form_urlencoded::parse(query?.as_bytes()) {
        if key == ETABLISSEMENT_ID_PARAM {
            id = Some(value.into_owned());
        } else if key == ETABLISSEMENT_NOM_PARAM {
            nom = Some(value.into_owned());
        }
    }

    Some(TenantParams {
        subdomain: None,
        etablissement_id: id.filter(|id| !id.is_empty())?,
        etablissement_nom: nom,
    })
}

fn from_headers(parts: &Parts) -> Option<TenantParams> {
    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string())
    };

    let id = header(ETABLISSEMENT_ID_HEADER).filter(|id| !id.is_empty())?;
    // The router writes the name form-urlencoded
    let nom = header(ETABLISSEMENT_NOM_HEADER).map(|encoded| {
        url::form_urlencoded::parse(format!("v={}", encoded).as_bytes())
            .next()
            .map(|(_, value)| value.into_owned())
            .unwrap_or(encoded)
    });

    Some(TenantParams {
        subdomain: None,
        etablissement_id: id,
        etablissement_nom: nom,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPageView {
    pub subdomain: String,
    pub page: String,
    pub etablissement_id: String,
    pub etablissement_nom: Option<String>,
    pub user: Option<SessionUser>,
}

/// GET /etablissements/:subdomain
pub async fn tenant_home(
    Path(subdomain): Path<String>,
    tenant: TenantParams,
    session: Option<Extension<Session>>,
) -> ApiResult<TenantPageView> {
    render(subdomain, "/".to_string(), tenant, session)
}

/// GET /etablissements/:subdomain/*rest
pub async fn tenant_page(
    Path((subdomain, rest)): Path<(String, String)>,
    tenant: TenantParams,
    session: Option<Extension<Session>>,
) -> ApiResult<TenantPageView> {
    let page = format!("/{}", rest.trim_start_matches('/'));
    render(subdomain, page, tenant, session)
}

fn render(
    subdomain: String,
    page: String,
    tenant: TenantParams,
    session: Option<Extension<Session>>,
) -> ApiResult<TenantPageView> {
    if let Some(routed) = tenant.subdomain.as_deref() {
        if routed != subdomain {
            tracing::warn!("Tenant route '{}' does not match routed subdomain '{}'", subdomain, routed);
            return Err(ApiError::not_found(format!("Unknown établissement '{}'", subdomain)));
        }
    }

    Ok(ApiResponse::success(TenantPageView {
        subdomain,
        page,
        etablissement_id: tenant.etablissement_id,
        etablissement_nom: tenant.etablissement_nom,
        user: session.and_then(|Extension(session)| session.user),
    }))
}
