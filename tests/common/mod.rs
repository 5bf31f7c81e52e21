#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use classio::app::{self, AppState};
use classio::auth::{issue_token, Claims, JwtSessionResolver};
use classio::database::{Etablissement, InMemoryEtablissementStore};
use classio::middleware::TenantRouter;
use classio::tenant::{
    LookupError, LookupResponse, TenancySettings, TenantCache, TenantLookup, TenantValidator,
};

pub const MAIN_DOMAIN: &str = "example.com";
pub const SESSION_COOKIE: &str = "classio_session";
pub const JWT_SECRET: &str = "integration-test-secret";

/// Scripted validation endpoint: known subdomains are valid, `broken` fails,
/// everything else is invalid. Counts calls.
#[derive(Default)]
pub struct StubLookup {
    known: HashMap<String, (String, String)>,
    calls: AtomicUsize,
}

impl StubLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(mut self, subdomain: &str, id: &str, nom: &str) -> Self {
        self.known.insert(subdomain.to_string(), (id.to_string(), nom.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantLookup for StubLookup {
    async fn lookup(&self, subdomain: &str) -> Result<LookupResponse, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if subdomain == "broken" {
            return Err(LookupError::Decode("scripted failure".to_string()));
        }
        Ok(match self.known.get(subdomain) {
            Some((id, nom)) => LookupResponse::valid(id.clone(), nom.clone()),
            None => LookupResponse::invalid(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub lookup: Arc<StubLookup>,
}

impl TestApp {
    /// Application on `example.com` with `acme` registered both in the
    /// lookup stub and the établissement store
    pub async fn new() -> Self {
        let lookup = Arc::new(StubLookup::new().with_tenant("acme", "etab-1", "Lycée Acme"));
        Self::with_lookup(lookup).await
    }

    pub async fn with_lookup(lookup: Arc<StubLookup>) -> Self {
        let store = InMemoryEtablissementStore::new();
        store.upsert(Etablissement::new("etab-1", "Lycée Acme", "acme")).await;
        let state = AppState::new(Arc::new(store));

        let validator = TenantValidator::new(Arc::new(TenantCache::default()), lookup.clone());
        let tenant_router = TenantRouter::new(
            TenancySettings::new(MAIN_DOMAIN),
            Arc::new(validator),
            Arc::new(JwtSessionResolver::new(JWT_SECRET, SESSION_COOKIE)),
        );

        Self {
            router: app::app(state, tenant_router),
            lookup,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        let response = self.router.clone().oneshot(request).await.context("request failed")?;
        Ok(response)
    }
}

/// GET `path` on `host`, optionally with a session cookie
pub fn get(host: &str, path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path).header(header::HOST, host);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
    }
    builder.body(Body::empty()).expect("valid request")
}

pub fn session_token() -> String {
    let claims = Claims::new(Uuid::new_v4(), "enseignant", Some("etab-1".to_string()), 1);
    issue_token(&claims, JWT_SECRET).expect("token")
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

pub async fn json_body(response: Response<Body>) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn is_redirect(status: StatusCode) -> bool {
    status == StatusCode::TEMPORARY_REDIRECT
}
