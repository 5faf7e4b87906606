use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cloakworks_product_server::adapter::handler::{self, AppState};
use cloakworks_product_server::adapter::repository::ProductPostgresRepository;
use cloakworks_product_server::infrastructure::config::Config;
use cloakworks_product_server::infrastructure::JwksVerifierAdapter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        "starting product server"
    );

    // Token verifier
    let issuer = cloakworks_auth::issuer::resolve_issuer(cfg.auth.issuer.as_deref());
    let jwks_url = cloakworks_auth::issuer::jwks_url(&issuer);
    info!(issuer = %issuer, jwks_url = %jwks_url, "initializing JWKS verifier");
    let verifier = Arc::new(cloakworks_auth::JwksVerifier::new(
        &jwks_url,
        &issuer,
        cfg.auth.audience.as_deref(),
        std::time::Duration::from_secs(cfg.auth.jwks_cache_ttl_secs),
    ));

    // Database pool (DATABASE_URL overrides config)
    let db_url = std::env::var("DATABASE_URL")
        .ok()
        .or_else(|| cfg.database.as_ref().map(|d| d.connection_url()))
        .ok_or_else(|| {
            anyhow::anyhow!("no database configured: set database in config or DATABASE_URL")
        })?;
    let max_conns = cfg.database.as_ref().map(|d| d.max_open_conns).unwrap_or(25);
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_conns)
        .connect(&db_url)
        .await?;
    info!("database connection pool established");

    let product_repo = Arc::new(ProductPostgresRepository::new(pool.clone()));

    let state = AppState::new(
        Arc::new(JwksVerifierAdapter::new(verifier)),
        product_repo,
        Some(pool),
        Some(issuer),
    );

    let app = handler::router(state);

    let addr = cfg.server.bind_addr()?;
    info!("REST server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
