use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::tenant::TenancySettings;

pub fn handle(hostname: &str, main_domain: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let settings = match main_domain {
        Some(domain) => TenancySettings::new(domain),
        None => config().tenancy_settings(),
    };

    let candidate = settings.resolve_candidate(hostname);
    let message = candidate.clone().unwrap_or_else(|| "none".to_string());

    output_success(
        &output_format,
        &message,
        json!({
            "hostname": hostname,
            "main_domain": settings.main_domain,
            "dev_mode": settings.is_dev_mode(),
            "candidate": candidate,
        }),
    )
}
