//! Roster server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use roster_core::config::AppConfig;
use roster_db::UserStore;
use roster_server::{AppState, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Roster - a user account service
#[derive(Parser, Debug)]
#[command(name = "rosterd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "ROSTER_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Startup banner
    tracing::info!("Roster v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    let has_config_file = config_path.exists();

    if has_config_file {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    // Check for ROSTER_ environment variables (excluding ROSTER_CONFIG which is just the path)
    let has_env_config =
        std::env::vars().any(|(key, _)| key.starts_with("ROSTER_") && key != "ROSTER_CONFIG");

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: rosterd --config /path/to/config.toml\n  \
             2. Environment variables: ROSTER_SERVER__BIND=0.0.0.0:8080 \
             ROSTER_AUTH__JWT_SECRET=your-secret rosterd\n\n\
             See config/server.example.toml for example configuration.\n\
             Set ROSTER_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("ROSTER_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Initialize the user store (runs migrations on connect)
    let store = roster_db::from_config(&config.database)
        .await
        .context("failed to initialize user store")?;
    tracing::info!("User store initialized");

    // Verify store connectivity before accepting requests.
    // This catches configuration errors and connectivity issues early,
    // preventing the server from reporting healthy when the database is unreachable.
    store
        .health_check()
        .await
        .context("user store health check failed")?;
    tracing::info!("User store connectivity verified");

    // Create application state and router
    let state = AppState::new(config.clone(), store);
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
