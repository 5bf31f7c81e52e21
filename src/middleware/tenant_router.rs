use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, request::Parts, uri::PathAndQuery, HeaderValue, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{Session, SessionResolver};
use crate::tenant::{
    path_has_prefix, TenancySettings, TenantContext, TenantStatus, TenantValidator, ETABLISSEMENT_ID_HEADER,
    ETABLISSEMENT_ID_PARAM, ETABLISSEMENT_NOM_HEADER, ETABLISSEMENT_NOM_PARAM,
};

/// Public routes on the main domain. `/` matches exactly, the rest by prefix.
const MAIN_PUBLIC_ROUTES: &[&str] = &["/", "/sign-in"];
/// Public routes under a tenant subdomain
const TENANT_PUBLIC_ROUTES: &[&str] = &["/sign-in"];

const SIGN_IN_PATH: &str = "/sign-in";
const CALLBACK_PARAM: &str = "callbackUrl";
const TENANT_ROUTE_PREFIX: &str = "/etablissements";

/// What the router does with one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    PassThrough,
    /// Absolute URL
    Redirect(String),
    Rewrite {
        path_and_query: String,
        tenant: TenantContext,
    },
}

/// Subdomain tenancy router: decides between pass-through, redirect and
/// rewrite for every request before route matching happens.
#[derive(Clone)]
pub struct TenantRouter {
    settings: Arc<TenancySettings>,
    validator: Arc<TenantValidator>,
    sessions: Arc<dyn SessionResolver>,
}

impl TenantRouter {
    pub fn new(settings: TenancySettings, validator: Arc<TenantValidator>, sessions: Arc<dyn SessionResolver>) -> Self {
        Self {
            settings: Arc::new(settings),
            validator,
            sessions,
        }
    }

    /// Compute the decision for a request. The session is returned when it
    /// had to be resolved.
    pub async fn decide(&self, parts: &Parts) -> (RouteDecision, Option<Session>) {
        let path = parts.uri.path();

        if self.settings.is_excluded(path) {
            return (RouteDecision::PassThrough, None);
        }

        let host = request_host(parts);
        let candidate = host.as_deref().and_then(|h| self.settings.resolve_candidate(h));

        let Some(subdomain) = candidate else {
            return self.decide_main_domain(parts, path).await;
        };

        match self.validator.validate(&subdomain).await {
            TenantStatus::Invalid => {
                tracing::info!("Unknown tenant '{}', redirecting to main site", subdomain);
                (RouteDecision::Redirect(self.settings.main_site_url()), None)
            }
            TenantStatus::Unknown => {
                // Fail open on the tenant only: no rewrite, sign-in still applies
                tracing::warn!("Tenant '{}' could not be validated, routing as main domain", subdomain);
                self.decide_main_domain(parts, path).await
            }
            TenantStatus::Valid(identity) => {
                let mut session = None;
                if !is_public(path, TENANT_PUBLIC_ROUTES) {
                    session = self.resolve_session(parts).await;
                    if session.is_none() {
                        tracing::debug!("Unauthenticated request to '{}' on tenant '{}'", path, subdomain);
                        return (RouteDecision::Redirect(self.sign_in_url(parts, path)), None);
                    }
                }

                let tenant = TenantContext { subdomain, identity };
                let path_and_query = rewrite_target(&tenant, path, parts.uri.query());
                tracing::debug!("Rewriting '{}' to '{}'", path, path_and_query);
                (RouteDecision::Rewrite { path_and_query, tenant }, session)
            }
        }
    }

    /// Main-domain rules: `/` and `/sign-in` are public, everything else
    /// needs a session.
    async fn decide_main_domain(&self, parts: &Parts, path: &str) -> (RouteDecision, Option<Session>) {
        if is_public(path, MAIN_PUBLIC_ROUTES) {
            return (RouteDecision::PassThrough, None);
        }

        let session = self.resolve_session(parts).await;
        if session.is_none() {
            tracing::debug!("Unauthenticated request to '{}' without tenant", path);
            return (RouteDecision::Redirect(self.sign_in_url(parts, path)), None);
        }
        (RouteDecision::PassThrough, session)
    }

    /// Decide and apply the decision to `parts`. Returns the redirect URL
    /// when the request must not continue.
    pub async fn route(&self, parts: &mut Parts) -> Option<String> {
        if !self.settings.is_excluded(parts.uri.path()) {
            strip_tenant_headers(parts);
        }

        let (decision, session) = self.decide(parts).await;
        if let Some(session) = session {
            parts.extensions.insert(session);
        }

        match decision {
            RouteDecision::PassThrough => None,
            RouteDecision::Redirect(location) => Some(location),
            RouteDecision::Rewrite { path_and_query, tenant } => {
                apply_rewrite(parts, &path_and_query, tenant);
                None
            }
        }
    }

    async fn resolve_session(&self, parts: &Parts) -> Option<Session> {
        self.sessions
            .resolve(parts)
            .await
            .filter(|session| session.is_authenticated())
    }

    fn sign_in_url(&self, parts: &Parts, path: &str) -> String {
        let origin = request_origin(parts, &self.settings);
        let mut url = match url::Url::parse(&origin).and_then(|base| base.join(SIGN_IN_PATH)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Unusable request origin '{}': {}", origin, e);
                let fallback = format!("{}://{}{}", self.settings.default_scheme, self.settings.main_domain, SIGN_IN_PATH);
                match url::Url::parse(&fallback) {
                    Ok(url) => url,
                    Err(_) => return format!("{}?{}={}", SIGN_IN_PATH, CALLBACK_PARAM, encode_component(path)),
                }
            }
        };
        url.query_pairs_mut().append_pair(CALLBACK_PARAM, path);
        url.to_string()
    }
}

/// axum middleware entry point. Must wrap the whole `Router` so that
/// rewrites are visible to route matching.
pub async fn tenant_router_middleware(State(router): State<TenantRouter>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    match router.route(&mut parts).await {
        Some(location) => Redirect::temporary(&location).into_response(),
        None => next.run(Request::from_parts(parts, body)).await,
    }
}

fn is_public(path: &str, routes: &[&str]) -> bool {
    routes.iter().any(|route| {
        if *route == "/" {
            path == "/"
        } else {
            path_has_prefix(path, route)
        }
    })
}

fn request_host(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
        .or_else(|| parts.uri.authority().map(|authority| authority.to_string()))
}

/// `scheme://host[:port]` of the current request
fn request_origin(parts: &Parts, settings: &TenancySettings) -> String {
    let scheme = parts
        .headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| value == "http" || value == "https")
        .or_else(|| parts.uri.scheme_str().map(|s| s.to_string()))
        .unwrap_or_else(|| settings.default_scheme.clone());

    let host = request_host(parts).unwrap_or_else(|| settings.main_domain.clone());
    format!("{}://{}", scheme, host)
}

/// `/etablissements/<subdomain><path>` with the original query pairs copied
/// verbatim, followed by the tenant parameters. Existing tenant keys are
/// dropped, so each appears exactly once.
pub fn rewrite_target(tenant: &TenantContext, path: &str, query: Option<&str>) -> String {
    let mut target = format!("{}/{}", TENANT_ROUTE_PREFIX, tenant.subdomain);
    if path != "/" {
        target.push_str(path);
    }

    let tenant_params = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(ETABLISSEMENT_ID_PARAM, &tenant.identity.id)
        .append_pair(ETABLISSEMENT_NOM_PARAM, &tenant.identity.nom)
        .finish();

    let mut pairs: Vec<&str> = query
        .into_iter()
        .flat_map(|query| query.split('&'))
        .filter(|pair| !pair.is_empty() && !is_tenant_param(pair))
        .collect();
    pairs.push(&tenant_params);

    target.push('?');
    target.push_str(&pairs.join("&"));
    target
}

fn is_tenant_param(raw_pair: &str) -> bool {
    url::form_urlencoded::parse(raw_pair.as_bytes())
        .next()
        .is_some_and(|(key, _)| key == ETABLISSEMENT_ID_PARAM || key == ETABLISSEMENT_NOM_PARAM)
}

fn apply_rewrite(parts: &mut Parts, path_and_query: &str, tenant: TenantContext) {
    let rewritten = PathAndQuery::try_from(path_and_query).map_err(|e| e.to_string()).and_then(|pq| {
        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.path_and_query = Some(pq);
        Uri::from_parts(uri_parts).map_err(|e| e.to_string())
    });

    match rewritten {
        Ok(uri) => parts.uri = uri,
        Err(e) => {
            tracing::error!("Failed to rewrite request to '{}': {}", path_and_query, e);
            return;
        }
    }

    if let Ok(value) = HeaderValue::from_str(&tenant.identity.id) {
        parts.headers.insert(ETABLISSEMENT_ID_HEADER, value);
    }
    // Names may hold non-ASCII characters; header carries the encoded form
    if let Ok(value) = HeaderValue::from_str(&encode_component(&tenant.identity.nom)) {
        parts.headers.insert(ETABLISSEMENT_NOM_HEADER, value);
    }
    parts.extensions.insert(tenant);
}

fn strip_tenant_headers(parts: &mut Parts) {
    parts.headers.remove(ETABLISSEMENT_ID_HEADER);
    parts.headers.remove(ETABLISSEMENT_NOM_HEADER);
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
