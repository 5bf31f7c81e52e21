// tenant/lookup.rs - Transport seam between the validator and the validation endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of `GET <validation endpoint>?subdomain=<candidate>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etablissement_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etablissement_nom: Option<String>,
}

impl LookupResponse {
    pub fn valid(id: impl Into<String>, nom: impl Into<String>) -> Self {
        Self {
            valid: true,
            etablissement_id: Some(id.into()),
            etablissement_nom: Some(nom.into()),
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            etablissement_id: None,
            etablissement_nom: None,
        }
    }
}

/// Soft failures: the validator turns every one of these into `Unknown`
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Lookup transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Lookup endpoint returned status {0}")]
    Status(StatusCode),

    #[error("Malformed lookup response: {0}")]
    Decode(String),

    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid lookup endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[async_trait]
pub trait TenantLookup: Send + Sync {
    async fn lookup(&self, subdomain: &str) -> Result<LookupResponse, LookupError>;
}

/// Calls the validation endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpTenantLookup {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl HttpTenantLookup {
    /// `timeout` bounds the whole request, connect included
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, LookupError> {
        let endpoint = url::Url::parse(endpoint)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl TenantLookup for HttpTenantLookup {
    async fn lookup(&self, subdomain: &str) -> Result<LookupResponse, LookupError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("subdomain", subdomain);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<LookupResponse>(&body).map_err(|e| LookupError::Decode(e.to_string()))
    }
}
