// tenant/validator.rs - Cache-first tenant validation with fail-open lookups

use std::sync::Arc;
use std::time::Duration;

use super::cache::{CachedVerdict, TenantCache};
use super::lookup::{LookupError, LookupResponse, TenantLookup};
use super::TenantIdentity;

/// Upper bound on a single lookup when none is configured
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of validating a tenant candidate.
///
/// `Unknown` is only produced by lookup failures and is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantStatus {
    Valid(TenantIdentity),
    Invalid,
    Unknown,
}

impl From<CachedVerdict> for TenantStatus {
    fn from(verdict: CachedVerdict) -> Self {
        match verdict {
            CachedVerdict::Valid(identity) => TenantStatus::Valid(identity),
            CachedVerdict::Invalid => TenantStatus::Invalid,
        }
    }
}

pub struct TenantValidator {
    cache: Arc<TenantCache>,
    lookup: Arc<dyn TenantLookup>,
    timeout: Duration,
}

impl TenantValidator {
    pub fn new(cache: Arc<TenantCache>, lookup: Arc<dyn TenantLookup>) -> Self {
        Self {
            cache,
            lookup,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<TenantCache> {
        &self.cache
    }

    /// Validate a non-empty subdomain candidate
    pub async fn validate(&self, candidate: &str) -> TenantStatus {
        if let Some(verdict) = self.cache.get(candidate).await {
            tracing::debug!("Tenant cache hit for '{}'", candidate);
            return verdict.into();
        }

        let response = match tokio::time::timeout(self.timeout, self.lookup.lookup(candidate)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(self.timeout)),
        };

        match response.and_then(|response| verdict_from_response(candidate, response)) {
            Ok(verdict) => {
                tracing::info!(
                    "Tenant '{}' validated: {}",
                    candidate,
                    if matches!(verdict, CachedVerdict::Valid(_)) { "valid" } else { "invalid" }
                );
                self.cache.insert(candidate, verdict.clone()).await;
                verdict.into()
            }
            Err(e) => {
                tracing::warn!("Tenant '{}' validation unknown, failing open: {}", candidate, e);
                TenantStatus::Unknown
            }
        }
    }
}

/// A `valid: true` answer without an id cannot be rewritten into a tenant
/// route and counts as a malformed response. A missing name falls back to
/// the subdomain.
fn verdict_from_response(candidate: &str, response: LookupResponse) -> Result<CachedVerdict, LookupError> {
    if !response.valid {
        return Ok(CachedVerdict::Invalid);
    }

    let id = response
        .etablissement_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| LookupError::Decode("valid response without etablissementId".to_string()))?;
    let nom = response
        .etablissement_nom
        .filter(|nom| !nom.is_empty())
        .unwrap_or_else(|| candidate.to_string());

    Ok(CachedVerdict::Valid(TenantIdentity::new(id, nom)))
}
