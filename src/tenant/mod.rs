// tenant/mod.rs - Subdomain multi-tenancy: host parsing, validation, caching

pub mod cache;
pub mod host;
pub mod lookup;
pub mod validator;

pub use cache::{CachedVerdict, Clock, ManualClock, SystemClock, TenantCache, DEFAULT_TENANT_CAPACITY, DEFAULT_TENANT_TTL};
pub use host::resolve_tenant_candidate;
pub use lookup::{HttpTenantLookup, LookupError, LookupResponse, TenantLookup};
pub use validator::{TenantStatus, TenantValidator, DEFAULT_LOOKUP_TIMEOUT};

use serde::{Deserialize, Serialize};

/// Query parameter carrying the tenant id on rewritten requests
pub const ETABLISSEMENT_ID_PARAM: &str = "etablissementId";
/// Query parameter carrying the tenant display name on rewritten requests
pub const ETABLISSEMENT_NOM_PARAM: &str = "etablissementNom";
/// Header mirror of `etablissementId` for server-side data fetches
pub const ETABLISSEMENT_ID_HEADER: &str = "x-etablissement-id";
pub const ETABLISSEMENT_NOM_HEADER: &str = "x-etablissement-nom";

/// Identity of a validated établissement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantIdentity {
    pub id: String,
    pub nom: String,
}

impl TenantIdentity {
    pub fn new(id: impl Into<String>, nom: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nom: nom.into(),
        }
    }
}

/// Tenant identity attached to a rewritten request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub subdomain: String,
    pub identity: TenantIdentity,
}

/// Routing inputs derived from configuration
#[derive(Debug, Clone)]
pub struct TenancySettings {
    pub main_domain: String,
    pub default_scheme: String,
    pub excluded_prefixes: Vec<String>,
}

impl TenancySettings {
    pub fn new(main_domain: impl Into<String>) -> Self {
        let main_domain = main_domain.into();
        let default_scheme = if main_domain.contains("localhost") { "http" } else { "https" };
        Self {
            main_domain,
            default_scheme: default_scheme.to_string(),
            excluded_prefixes: vec![
                "/api".to_string(),
                "/health".to_string(),
                "/_next".to_string(),
                "/static".to_string(),
                "/favicon.ico".to_string(),
            ],
        }
    }

    /// Dev-mode host parsing applies when the main domain is a loopback name
    pub fn is_dev_mode(&self) -> bool {
        self.main_domain.contains("localhost")
    }

    pub fn resolve_candidate(&self, hostname: &str) -> Option<String> {
        resolve_tenant_candidate(hostname, &self.main_domain, self.is_dev_mode())
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|prefix| path_has_prefix(path, prefix))
    }

    /// Redirect target for unknown tenants
    pub fn main_site_url(&self) -> String {
        format!("https://www.{}/", self.main_domain)
    }
}

/// Segment-aware prefix match: `/api` matches `/api` and `/api/x`, not `/apix`
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_has_prefix_respects_segments() {
        assert!(path_has_prefix("/api", "/api"));
        assert!(path_has_prefix("/api/auth/callback", "/api"));
        assert!(!path_has_prefix("/apiary", "/api"));
        assert!(path_has_prefix("/sign-in/reset", "/sign-in/"));
        assert!(!path_has_prefix("/", "/sign-in"));
    }

    #[test]
    fn test_settings_dev_mode_and_main_site() {
        let dev = TenancySettings::new("localhost:3000");
        assert!(dev.is_dev_mode());
        assert_eq!(dev.default_scheme, "http");

        let prod = TenancySettings::new("example.com");
        assert!(!prod.is_dev_mode());
        assert_eq!(prod.default_scheme, "https");
        assert_eq!(prod.main_site_url(), "https://www.example.com/");
        assert_eq!(prod.resolve_candidate("acme.example.com"), Some("acme".to_string()));
    }

    #[test]
    fn test_excluded_paths() {
        let settings = TenancySettings::new("example.com");
        assert!(settings.is_excluded("/api/etablissements/validate"));
        assert!(settings.is_excluded("/favicon.ico"));
        assert!(settings.is_excluded("/_next/static/chunk.js"));
        assert!(!settings.is_excluded("/dashboard"));
    }
}
