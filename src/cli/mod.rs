pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "classio")]
#[command(about = "Classio CLI - tenant resolution and session tooling")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Resolve the tenant candidate for a hostname")]
    Host {
        #[arg(help = "Hostname, optionally with port (acme.example.com, acme.localhost:3000)")]
        hostname: String,
        #[arg(long, help = "Main domain (defaults to MAIN_DOMAIN)")]
        main_domain: Option<String>,
    },

    #[command(about = "Ask the validation endpoint about a subdomain")]
    Check {
        #[arg(help = "Subdomain to validate")]
        subdomain: String,
        #[arg(long, help = "Validation endpoint (defaults to TENANT_VALIDATION_URL)")]
        url: Option<String>,
        #[arg(long, help = "Lookup timeout in milliseconds")]
        timeout_ms: Option<u64>,
    },

    #[command(about = "Issue a development session token")]
    Token {
        #[arg(long, help = "User id (UUID)")]
        user: uuid::Uuid,
        #[arg(long, help = "User role")]
        role: String,
        #[arg(long, help = "Etablissement id bound to the session")]
        etablissement: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Host { hostname, main_domain } => commands::host::handle(&hostname, main_domain, output_format),
        Commands::Check {
            subdomain,
            url,
            timeout_ms,
        } => commands::check::handle(&subdomain, url, timeout_ms, output_format).await,
        Commands::Token {
            user,
            role,
            etablissement,
        } => commands::token::handle(user, role, etablissement, output_format),
    }
}
