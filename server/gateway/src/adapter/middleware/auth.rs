use axum::{
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::adapter::handler::AppState;
use cloakworks_auth::extract_bearer_token;

/// auth_middleware は Bearer トークンを検証してからプロキシ転送に進める
/// axum ミドルウェア。トークンが存在しないか無効な場合は 401 Unauthorized を返し、
/// リクエストはアップストリームに到達しない。
/// 検証に成功した場合も Authorization ヘッダはそのまま転送される。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(&req) {
        Ok(t) => t,
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": {
                        "code": "GW_AUTH_MISSING_TOKEN",
                        "message": "Authorization header with Bearer token is required"
                    }
                })),
            )
                .into_response();
        }
    };

    match state.verifier.verify_token(&token).await {
        Ok(claims) => {
            debug!(username = %claims.username(), path = %req.uri().path(), "token verified");
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": {
                    "code": "GW_AUTH_TOKEN_INVALID",
                    "message": "Token validation failed"
                }
            })),
        )
            .into_response(),
    }
}
