use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cloakworks_user_server::adapter::handler::{self, AppState};
use cloakworks_user_server::adapter::repository::UserPostgresRepository;
use cloakworks_user_server::infrastructure::config::Config;
use cloakworks_user_server::infrastructure::JwksVerifierAdapter;

fn build_verifier(cfg: &Config, issuer: &str, jwks_url: &str) -> anyhow::Result<cloakworks_auth::JwksVerifier> {
    let cache_ttl = std::time::Duration::from_secs(cfg.auth.jwks_cache_ttl_secs);

    if cfg.auth.insecure_skip_tls_verify {
        #[cfg(feature = "dev-insecure-tls")]
        {
            let fetcher = cloakworks_auth::verifier::DefaultJwksFetcher::insecure()
                .map_err(|e| anyhow::anyhow!("insecure JWKS fetcher: {e}"))?;
            return Ok(cloakworks_auth::JwksVerifier::with_fetcher(
                jwks_url,
                issuer,
                cfg.auth.audience.as_deref(),
                cache_ttl,
                Arc::new(fetcher),
            ));
        }
        #[cfg(not(feature = "dev-insecure-tls"))]
        anyhow::bail!(
            "auth.insecure_skip_tls_verify requires a build with the dev-insecure-tls feature"
        );
    }

    Ok(cloakworks_auth::JwksVerifier::new(
        jwks_url,
        issuer,
        cfg.auth.audience.as_deref(),
        cache_ttl,
    ))
}

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
        "starting user server"
    );

    // Token verifier
    let issuer = cloakworks_auth::issuer::resolve_issuer(cfg.auth.issuer.as_deref());
    let jwks_url = cloakworks_auth::issuer::jwks_url(&issuer);
    info!(issuer = %issuer, jwks_url = %jwks_url, "initializing JWKS verifier");
    let verifier = Arc::new(build_verifier(&cfg, &issuer, &jwks_url)?);

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

    let user_repo = Arc::new(UserPostgresRepository::new(pool.clone()));

    let state = AppState::new(
        Arc::new(JwksVerifierAdapter::new(verifier)),
        user_repo,
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
