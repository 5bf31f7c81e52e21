use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::tenant::TenancySettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub tenancy: TenancyConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Apex domain, optionally with a port. Contains "localhost" in development.
    pub main_domain: String,
    pub validation_url: String,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub validation_timeout_ms: u64,
    /// Scheme used for redirects when no x-forwarded-proto header is present
    pub default_scheme: String,
    pub excluded_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub session_cookie: String,
    pub jwt_expiry_hours: u64,
}

const DEFAULT_MAIN_DOMAIN: &str = "localhost:3000";

fn default_excluded_prefixes() -> Vec<String> {
    ["/api", "/health", "/_next", "/static", "/assets", "/favicon.ico", "/robots.txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("CLASSIO_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Tenancy overrides
        if let Ok(v) = env::var("MAIN_DOMAIN").or_else(|_| env::var("NEXT_PUBLIC_MAIN_DOMAIN")) {
            if !v.trim().is_empty() {
                self.tenancy.main_domain = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("TENANT_VALIDATION_URL") {
            self.tenancy.validation_url = v;
        }
        if let Ok(v) = env::var("TENANT_CACHE_TTL_SECS") {
            self.tenancy.cache_ttl_secs = v.parse().unwrap_or(self.tenancy.cache_ttl_secs);
        }
        if let Ok(v) = env::var("TENANT_CACHE_MAX_ENTRIES") {
            self.tenancy.cache_max_entries = v.parse().unwrap_or(self.tenancy.cache_max_entries);
        }
        if let Ok(v) = env::var("TENANT_VALIDATION_TIMEOUT_MS") {
            self.tenancy.validation_timeout_ms = v.parse().unwrap_or(self.tenancy.validation_timeout_ms);
        }
        if let Ok(v) = env::var("TENANT_DEFAULT_SCHEME") {
            self.tenancy.default_scheme = v;
        }
        if let Ok(v) = env::var("TENANT_EXCLUDED_PREFIXES") {
            self.tenancy.excluded_prefixes = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.security.session_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    /// Router-facing view of the tenancy section
    pub fn tenancy_settings(&self) -> TenancySettings {
        TenancySettings {
            main_domain: self.tenancy.main_domain.clone(),
            default_scheme: self.tenancy.default_scheme.clone(),
            excluded_prefixes: self.tenancy.excluded_prefixes.clone(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.tenancy.cache_ttl_secs)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.tenancy.validation_timeout_ms)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            tenancy: TenancyConfig {
                main_domain: DEFAULT_MAIN_DOMAIN.to_string(),
                validation_url: "http://localhost:3000/api/etablissements/validate".to_string(),
                cache_ttl_secs: 3600,
                cache_max_entries: 10_000,
                validation_timeout_ms: 3000,
                default_scheme: "http".to_string(),
                excluded_prefixes: default_excluded_prefixes(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: "classio-dev-secret-change-me".to_string(),
                session_cookie: "classio_session".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            tenancy: TenancyConfig {
                main_domain: DEFAULT_MAIN_DOMAIN.to_string(),
                validation_url: "http://localhost:3000/api/etablissements/validate".to_string(),
                cache_ttl_secs: 3600,
                cache_max_entries: 10_000,
                validation_timeout_ms: 3000,
                default_scheme: "https".to_string(),
                excluded_prefixes: default_excluded_prefixes(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_cookie: "classio_session".to_string(),
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            tenancy: TenancyConfig {
                main_domain: DEFAULT_MAIN_DOMAIN.to_string(),
                validation_url: "http://localhost:3000/api/etablissements/validate".to_string(),
                cache_ttl_secs: 3600,
                cache_max_entries: 10_000,
                validation_timeout_ms: 2000,
                default_scheme: "https".to_string(),
                excluded_prefixes: default_excluded_prefixes(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_cookie: "classio_session".to_string(),
                jwt_expiry_hours: 8,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
