//! `suitelink` command-line entry point

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use suitelink_app::{commands, AppContext, CommandOutput};
use suitelink_domain::ReorderJobRequest;
use suitelink_infra::{config, init_tracing};

const DEFAULT_SERVICE: &str = "inventory";

#[derive(Debug, Parser)]
#[command(name = "suitelink")]
#[command(about = "Vendor token management, entity mirroring and reorder levels")]
struct Cli {
    /// Configuration file (TOML or JSON), taking precedence over SUITELINK_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Owner scope of the credentials to use
    #[arg(long, global = true)]
    scope: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Recompute item reorder levels from recent sales
    Reorder {
        #[arg(long)]
        look_back_days: Option<f64>,
        #[arg(long)]
        turnover_days: Option<f64>,
    },
    /// Exchange a one-time authorization code for stored tokens
    ExchangeCode {
        #[arg(long)]
        code: String,
        #[arg(long, default_value = DEFAULT_SERVICE)]
        service: String,
    },
    /// Show what credentials are stored
    TokenStatus,
    /// Revoke the stored credentials remotely and locally
    Revoke {
        #[arg(long, default_value = DEFAULT_SERVICE)]
        service: String,
    },
    /// Mirror one entity kind, e.g. `item` or `crm_lead`
    Sync { entity: String },
    /// Issue a GET through the gateway
    Get {
        service: String,
        endpoint: String,
        /// Query parameter as key=value; repeatable
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    let config = config::load_with(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.logging)?;
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "Could not load .env file"),
    }

    let ctx = AppContext::new(config).context("failed to initialise application context")?;
    let scope = cli.scope.as_deref();

    let output = match cli.command {
        Commands::Reorder { look_back_days, turnover_days } => {
            let request = ReorderJobRequest { look_back_days, inventory_turnover_days: turnover_days };
            commands::run_reorder(&ctx, request).await
        }
        Commands::ExchangeCode { code, service } => {
            commands::exchange_code(&ctx, &service, &code, scope).await
        }
        Commands::TokenStatus => commands::token_status(&ctx, scope).await,
        Commands::Revoke { service } => commands::revoke(&ctx, &service, scope).await,
        Commands::Sync { entity } => commands::sync_entity(&ctx, &entity, scope).await,
        Commands::Get { service, endpoint, query } => {
            commands::get(&ctx, &service, &endpoint, &query, scope).await
        }
    };

    emit(&output)?;
    Ok(if output.is_failure() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

#[allow(clippy::print_stdout)]
fn emit(output: &CommandOutput) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&output.body)?);
    Ok(())
}
