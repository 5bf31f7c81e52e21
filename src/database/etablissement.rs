// database/etablissement.rs - Tenant records as read by the validation endpoint

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;

use super::DatabaseError;

/// One school (tenant). `subdomain` is unique across all rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Etablissement {
    pub id: String,
    pub nom: String,
    pub subdomain: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait EtablissementStore: Send + Sync {
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Etablissement>, DatabaseError>;
}

pub struct PgEtablissementStore {
    pool: PgPool,
}

impl PgEtablissementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EtablissementStore for PgEtablissementStore {
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Etablissement>, DatabaseError> {
        let row = sqlx::query_as::<_, Etablissement>(
            r#"
            SELECT id, nom, subdomain, email, telephone, adresse, created_at, updated_at
            FROM etablissements
            WHERE subdomain = $1
            "#,
        )
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

/// Map-backed store for tests and database-less development
#[derive(Default)]
pub struct InMemoryEtablissementStore {
    by_subdomain: RwLock<HashMap<String, Etablissement>>,
}

impl InMemoryEtablissementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by subdomain
    pub async fn upsert(&self, etablissement: Etablissement) {
        self.by_subdomain
            .write()
            .await
            .insert(etablissement.subdomain.clone(), etablissement);
    }

    pub async fn remove(&self, subdomain: &str) -> Option<Etablissement> {
        self.by_subdomain.write().await.remove(subdomain)
    }
}

#[async_trait]
impl EtablissementStore for InMemoryEtablissementStore {
    async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Etablissement>, DatabaseError> {
        Ok(self.by_subdomain.read().await.get(subdomain).cloned())
    }
}

impl Etablissement {
    pub fn new(id: impl Into<String>, nom: impl Into<String>, subdomain: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            nom: nom.into(),
            subdomain: subdomain.into(),
            email: None,
            telephone: None,
            adresse: None,
            created_at: now,
            updated_at: now,
        }
    }
}
