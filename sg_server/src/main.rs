//! Multi-game lobby server.
//!
//! Serves battleship, simon says and lotería over a REST API backed by
//! Postgres, with JWT authentication.

use sg_server::{api, logging, metrics};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use salon_games::{
    audit::PgAuditLog,
    auth::AuthManager,
    db::Database,
    game::GameEngine,
    stats::PgStatsStore,
    store::PgGameStore,
};

use sg_server::config::ServerConfig;

const HELP: &str = "\
Run a multi-game lobby server

USAGE:
  sg_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND             Prometheus exporter bind address (optional)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT signing secret (required)
  PASSWORD_PEPPER          Password hashing pepper (required)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = pico_args::Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let db_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, db_url_override)?;
    tracing::info!("Starting game server at {}", config.bind);

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        tracing::info!("Prometheus exporter listening on {metrics_bind}");
    }

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
    db.migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    tracing::info!("Database connected and migrated");

    let pool = Arc::new(db.pool().clone());
    let engine = Arc::new(GameEngine::new(
        Arc::new(PgGameStore::new(pool.clone())),
        Arc::new(PgStatsStore::new(pool.clone())),
        Arc::new(PgAuditLog::new(pool.clone())),
    ));
    let auth_manager = Arc::new(AuthManager::new(
        pool.clone(),
        config.security.password_pepper.clone(),
        config.security.jwt_secret.clone(),
    ));

    let state = api::AppState {
        auth_manager,
        engine,
        pool,
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {e}", config.bind))?;
    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;

    tracing::info!("Shutting down server...");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {e}");
    }
}
