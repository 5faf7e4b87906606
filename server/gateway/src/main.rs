use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use cloakworks_gateway::adapter::handler::{self, AppState, RouteTable};
use cloakworks_gateway::infrastructure::config::Config;
use cloakworks_gateway::infrastructure::JwksVerifierAdapter;

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
        "starting gateway"
    );

    // Token verifier
    let issuer = cloakworks_auth::issuer::resolve_issuer(cfg.auth.issuer.as_deref());
    let jwks_url = cloakworks_auth::issuer::jwks_url(&issuer);
    info!(issuer = %issuer, jwks_url = %jwks_url, "initializing JWKS verifier");
    let verifier = Arc::new(build_verifier(&cfg, &issuer, &jwks_url)?);

    for route in &cfg.routes {
        info!(prefix = %route.prefix, upstream = %route.upstream, "route registered");
    }
    let routes = Arc::new(RouteTable::new(cfg.routes.clone()));

    let state = AppState::new(
        Arc::new(JwksVerifierAdapter::new(verifier)),
        routes,
        Some(issuer),
    );

    let app = handler::router(state);

    let addr = cfg.server.bind_addr()?;
    info!("gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
