pub mod error;
pub mod user_handler;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::adapter::middleware::auth::auth_middleware;
use crate::domain::repository::UserRepository;
use crate::infrastructure::TokenVerifier;

/// AppState はアプリケーション全体の共有状態を表す。
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub user_repo: Arc<dyn UserRepository>,
    pub db_pool: Option<sqlx::PgPool>,
    pub issuer_url: Option<String>,
}

impl AppState {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        user_repo: Arc<dyn UserRepository>,
        db_pool: Option<sqlx::PgPool>,
        issuer_url: Option<String>,
    ) -> Self {
        Self {
            verifier,
            user_repo,
            db_pool,
            issuer_url,
        }
    }
}

/// Build the REST API router.
pub fn router(state: AppState) -> Router {
    // Protected routes: Bearer token validation required.
    // /users/me は /users/{id} より先にマッチさせる必要があることに注意
    // (axum は静的セグメントを優先するため同居できる)
    let protected = Router::new()
        .route("/users", get(user_handler::list_users))
        .route("/users", post(user_handler::create_user))
        .route("/users/me", get(user_handler::me))
        .route("/users/{id}", get(user_handler::get_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public endpoints (no auth required)
    let public = Router::new()
        .route("/healthz", get(user_handler::healthz))
        .route("/readyz", get(user_handler::readyz));

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
        user_handler::healthz,
        user_handler::readyz,
        user_handler::list_users,
        user_handler::get_user,
        user_handler::create_user,
        user_handler::me,
    ),
    components(schemas(
        crate::domain::entity::user::User,
        crate::domain::entity::user::NewUser,
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
