use std::time::Duration;

use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::tenant::{HttpTenantLookup, LookupResponse, TenantLookup};

/// One uncached lookup against the validation endpoint
pub async fn handle(
    subdomain: &str,
    url: Option<String>,
    timeout_ms: Option<u64>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let endpoint = url.unwrap_or_else(|| config().tenancy.validation_url.clone());
    let timeout = timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config().validation_timeout());

    let lookup = HttpTenantLookup::new(&endpoint, timeout)?;
    let subdomain = subdomain.trim().to_lowercase();

    match lookup.lookup(&subdomain).await {
        Ok(response) => {
            let message = verdict_message(&subdomain, &response);
            output_success(&output_format, &message, json!({ "subdomain": subdomain, "verdict": response }))
        }
        Err(e) => {
            output_error(&output_format, &format!("Lookup failed: {}", e), Some("LOOKUP_FAILED"))?;
            Err(e.into())
        }
    }
}

fn verdict_message(subdomain: &str, response: &LookupResponse) -> String {
    match (response.valid, response.etablissement_nom.as_deref()) {
        (true, Some(nom)) => format!("{} is valid ({})", subdomain, nom),
        (true, None) => format!("{} is valid", subdomain),
        (false, _) => format!("{} is not a known etablissement", subdomain),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_check_queries_normalized_subdomain() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(Method::GET)
                .path("/api/etablissements/validate")
                .query_param("subdomain", "acme");
            then.status(200).json_body(json!({
                "valid": true,
                "etablissementId": "etab-1",
                "etablissementNom": "Lycée Acme"
            }));
        });

        let url = server.url("/api/etablissements/validate");
        let result = handle(" ACME ", Some(url), Some(2_000), OutputFormat::Json).await;

        assert!(result.is_ok());
        m.assert();
    }

    #[tokio::test]
    async fn test_check_fails_on_endpoint_error() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(Method::GET).path("/api/etablissements/validate");
            then.status(503);
        });

        let url = server.url("/api/etablissements/validate");
        let result = handle("acme", Some(url), Some(2_000), OutputFormat::Text).await;

        assert!(result.is_err());
    }

    #[test]
    fn test_verdict_message() {
        assert_eq!(
            verdict_message("acme", &LookupResponse::valid("etab-1", "Lycée Acme")),
            "acme is valid (Lycée Acme)"
        );
        assert_eq!(
            verdict_message("nope", &LookupResponse::invalid()),
            "nope is not a known etablissement"
        );
    }
}
