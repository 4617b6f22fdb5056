use anyhow::Context;
use dotenvy::dotenv;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shopfloor::config::AppConfig;
use shopfloor::core::session::JwtSessionOracle;
use shopfloor::core::shared::state::AppState;
use shopfloor::core::shared::utils::{create_conn, run_migrations};
use shopfloor::core::store::PgStore;
use shopfloor::main_module::run_axum_server;

fn config_path_from_args() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    let config_path = config_path_from_args();
    let config = AppConfig::load(config_path.as_deref()).context("failed to load configuration")?;

    let pool = create_conn(&config.database).context("failed to create database pool")?;
    if config.database.run_migrations {
        let migrate_pool = pool.clone();
        tokio::task::spawn_blocking(move || run_migrations(&migrate_pool))
            .await
            .context("migration task panicked")?
            .map_err(|e| anyhow::anyhow!("failed to run migrations: {e}"))?;
    }

    let oracle = JwtSessionOracle::new(&config.auth);
    if !oracle.is_configured() {
        warn!("No JWT key configured; every request will be treated as anonymous");
    }

    info!(
        "Starting {} {} on {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.bind_address()
    );

    let state = Arc::new(AppState::new(
        config,
        Arc::new(PgStore::new(pool)),
        Arc::new(oracle),
    ));
    run_axum_server(state).await?;

    info!("Server stopped");
    Ok(())
}
