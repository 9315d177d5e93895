//! # mediate-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the mediation registry.

use anyhow::Context;
use clap::Parser;
use mediate_core::Address;
use mediate_api::state::{AppConfig, AppState, DEFAULT_LEDGER_ADDRESS};

/// Mediation registry HTTP service.
#[derive(Parser)]
#[command(name = "mediate-api", version, about)]
struct Cli {
    /// Port to bind the HTTP server to.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Administrator of the registry and the ledger.
    #[arg(long, env = "MEDIATION_ADMIN")]
    admin: Address,

    /// Identity the ledger presents to the registry.
    #[arg(long, env = "MEDIATION_LEDGER_ADDRESS", default_value = DEFAULT_LEDGER_ADDRESS)]
    ledger_address: Address,

    /// Shared bearer secret. When unset, callers only name their address.
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Postgres connection string. When unset, state is in-memory only.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.admin.is_zero() {
        anyhow::bail!("the zero address cannot administer the registry");
    }

    let config = AppConfig {
        port: cli.port,
        auth_token: cli.auth_token,
        administrator: cli.admin,
        ledger_address: cli.ledger_address,
        database_url: cli.database_url,
    };
    tracing::info!(?config, "starting mediation registry");

    let db_pool = mediate_api::db::init_pool(config.database_url.as_deref())
        .await
        .context("database initialization failed")?;

    let state = AppState::with_pool(config, db_pool);
    state
        .hydrate_from_db()
        .await
        .map_err(|e| anyhow::anyhow!("database hydration failed: {e}"))?;

    let app = mediate_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cli.port));
    tracing::info!("Mediation API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
