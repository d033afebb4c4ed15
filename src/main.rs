use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use orgbill_backend::config::Config;
use orgbill_backend::db::postgres_organization_repository::PostgresOrganizationRepository;
use orgbill_backend::routes;
use orgbill_backend::services::stripe::LiveStripeService;
use orgbill_backend::AppState;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Establish a connection to the database and verify it.
async fn establish_connection(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPool::connect(database_url)
        .await
        .context("failed to connect to the database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("failed to verify database connection")?;

    info!("connected to the database");
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::from_env().map_err(|err| {
        error!(%err, "invalid configuration");
        anyhow::Error::new(err).context("invalid configuration")
    })?;

    let pool = establish_connection(&config.database_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid BIND_ADDR `{}`", config.bind_addr))?;

    let state = AppState::new(
        Arc::new(PostgresOrganizationRepository { pool }),
        Arc::new(LiveStripeService::from_settings(&config.stripe)),
        Arc::new(config),
    );
    let app = routes::app(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
