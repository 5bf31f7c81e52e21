// auth/session.rs - Session resolution for the tenant router

use async_trait::async_trait;
use axum::http::{header, request::Parts, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{verify_token, Claims};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub role: String,
    pub etablissement_id: Option<String>,
}

/// Current session as seen by the router. Only `user` is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<SessionUser>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user: Some(SessionUser {
                id: claims.sub,
                role: claims.role,
                etablissement_id: claims.etablissement_id,
            }),
        }
    }
}

/// "Resolve current session, given request context". Any failure is `None`.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, parts: &Parts) -> Option<Session>;
}

/// Reads a signed session JWT from the session cookie, falling back to a
/// bearer token
#[derive(Clone)]
pub struct JwtSessionResolver {
    secret: String,
    cookie_name: String,
}

impl JwtSessionResolver {
    pub fn new(secret: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: cookie_name.into(),
        }
    }

    fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        cookie_value(headers, &self.cookie_name).or_else(|| bearer_token(headers))
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, parts: &Parts) -> Option<Session> {
        let token = self.token_from_headers(&parts.headers)?;
        match verify_token(&token, &self.secret) {
            Ok(claims) => Some(Session::from(claims)),
            Err(e) => {
                tracing::debug!("Ignoring session token: {}", e);
                None
            }
        }
    }
}

/// Value of cookie `name` across all Cookie headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
