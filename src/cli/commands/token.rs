use serde_json::json;
use uuid::Uuid;

use crate::auth::{issue_token, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;

pub fn handle(
    user: Uuid,
    role: String,
    etablissement: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let security = &config().security;
    let claims = Claims::new(user, role, etablissement, security.jwt_expiry_hours);
    let token = issue_token(&claims, &security.jwt_secret)?;

    output_success(
        &output_format,
        &token,
        json!({
            "token": token,
            "cookie": security.session_cookie,
            "expires_at": claims.exp,
        }),
    )
}
