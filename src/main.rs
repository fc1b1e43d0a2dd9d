//! worldbench binary.
//!
//! Run with:
//!   RUST_LOG=info PGHOST=localhost PGSSLMODE=disable cargo run --release
//!
//! Try:
//!   curl http://localhost:8080/json
//!   curl http://localhost:8080/dbs?queries=20
//!   curl http://localhost:8080/updates?queries=5

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use worldbench::{AppState, Config, PgStore, Server, WorldStore, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is the normal case outside development.
    let _ = dotenvy::dotenv();
    init_tracing()?;

    let config = Config::from_env().context("invalid configuration")?;

    let store = PgStore::connect_lazy(&config.database);
    if let Err(e) = store.ping().await {
        warn!(
            host = %config.database.host,
            database = %config.database.name,
            error = %e,
            "database not reachable yet, serving anyway",
        );
    }

    let state = AppState::from_config(Arc::new(store.clone()), &config.service);
    let app = routes::router()
        .with_state(state)
        .server_name(&config.service.server_name);

    info!(
        max_connections = config.database.max_connections,
        db_concurrency = ?config.service.db_concurrency,
        strict_not_found = config.service.strict_not_found,
        "starting worldbench",
    );

    Server::bind(config.service.addr)
        .read_timeout(config.service.read_timeout)
        .serve(app)
        .await
        .context("server error")?;

    store.close().await;
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
}
