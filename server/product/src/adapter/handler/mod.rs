pub mod error;
pub mod product_handler;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::adapter::middleware::auth::auth_middleware;
use crate::domain::repository::ProductRepository;
use crate::infrastructure::TokenVerifier;

/// AppState はアプリケーション全体の共有状態を表す。
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub product_repo: Arc<dyn ProductRepository>,
    pub db_pool: Option<sqlx::PgPool>,
    pub issuer_url: Option<String>,
}

impl AppState {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        product_repo: Arc<dyn ProductRepository>,
        db_pool: Option<sqlx::PgPool>,
        issuer_url: Option<String>,
    ) -> Self {
        Self {
            verifier,
            product_repo,
            db_pool,
            issuer_url,
        }
    }
}

/// Build the REST API router.
pub fn router(state: AppState) -> Router {
    // Protected routes: Bearer token validation required
    let protected = Router::new()
        .route("/products", get(product_handler::list_products))
        .route("/products", post(product_handler::create_product))
        .route("/products/{id}", get(product_handler::get_product))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public endpoints (no auth required)
    let public = Router::new()
        .route("/healthz", get(product_handler::healthz))
        .route("/readyz", get(product_handler::readyz));

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// OpenAPI ドキュメント定義。
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        product_handler::healthz,
        product_handler::readyz,
        product_handler::list_products,
        product_handler::get_product,
        product_handler::create_product,
    ),
    components(schemas(
        crate::domain::entity::product::Product,
        crate::domain::entity::product::NewProduct,
    ))
)]
pub struct ApiDoc;

/// ErrorResponse は統一エラーレスポンス。
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
                request_id: uuid::Uuid::new_v4().to_string(),
                details: vec![],
            },
        }
    }
}
