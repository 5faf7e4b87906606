pub mod error;
pub mod gateway_handler;
pub mod proxy;

use std::sync::Arc;

use axum::body::Body;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower_http::trace::TraceLayer;

use crate::adapter::middleware::auth::auth_middleware;
use crate::infrastructure::config::RouteConfig;
use crate::infrastructure::TokenVerifier;

/// RouteTable はプレフィックスからアップストリームを引く転送表。
/// 最長一致で解決し、プレフィックス境界はパスセグメント単位で判定する
/// (`/users` は `/users/me` に一致するが `/username` には一致しない)。
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<RouteConfig>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Self { routes }
    }

    pub fn resolve(&self, path: &str) -> Option<&RouteConfig> {
        self.routes
            .iter()
            .filter(|r| {
                let prefix = r.prefix.trim_end_matches('/');
                path == prefix || path.starts_with(&format!("{}/", prefix))
            })
            .max_by_key(|r| r.prefix.trim_end_matches('/').len())
    }
}

/// AppState はゲートウェイ全体の共有状態を表す。
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub routes: Arc<RouteTable>,
    pub http_client: Client<HttpConnector, Body>,
    pub issuer_url: Option<String>,
}

impl AppState {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        routes: Arc<RouteTable>,
        issuer_url: Option<String>,
    ) -> Self {
        Self {
            verifier,
            routes,
            http_client: Client::builder(TokioExecutor::new()).build_http(),
            issuer_url,
        }
    }
}

/// Build the gateway router.
///
/// ヘルスチェック以外の全トラフィックは認証ミドルウェアを通り、
/// フォールバックのプロキシハンドラでアップストリームへ転送される。
pub fn router(state: AppState) -> Router {
    let proxy = Router::new()
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public = Router::new()
        .route("/healthz", get(gateway_handler::healthz))
        .route("/readyz", get(gateway_handler::readyz));

    Router::new()
        .merge(public)
        .merge(proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

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
