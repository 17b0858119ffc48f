// Chipset History - Web Server

use anyhow::{Context, Result};
use chipset_history::config::{Config, CONFIG_ENV_VAR};
use chipset_history::server::{router, AppState};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Serve chipset history comparisons over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:3000", env = "CHIPSET_HISTORY_ADDR")]
    addr: String,

    /// TOML config file with comparison defaults
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chipset_history=info,chipset_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    info!(
        identifier_field = %config.identifier_field,
        removal_scope = %config.removal_scope,
        "Loaded configuration"
    );

    let app = router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    info!("🚀 Server running on http://{}", args.addr);
    info!("   API: POST http://{}/api/compare", args.addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
