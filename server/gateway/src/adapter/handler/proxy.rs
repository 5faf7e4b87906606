use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, Uri},
    response::Response,
};
use tracing::{debug, error};

use super::error::GatewayError;
use super::AppState;

/// フォールバックのプロキシハンドラ。
///
/// パスを転送表で最長一致させ、URI をアップストリームの authority に
/// 書き換えて転送する。パスとクエリはそのまま保たれ、Authorization ヘッダも
/// 書き換えない。一致するルートが無ければ 404。
pub async fn forward(
    State(state): State<AppState>,
    mut req: Request<Body>,
) -> Result<Response, GatewayError> {
    let path = req.uri().path().to_string();
    let route = state
        .routes
        .resolve(&path)
        .ok_or_else(|| GatewayError::NoRoute(path.clone()))?;

    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or(path);
    let target_uri = format!("{}{}", route.upstream.trim_end_matches('/'), path_and_query);

    debug!(target = %target_uri, "proxying request");

    let uri: Uri = target_uri
        .parse()
        .map_err(|e| GatewayError::BadTarget(format!("{}: {}", target_uri, e)))?;
    *req.uri_mut() = uri;

    // Host ヘッダを転送先の authority に合わせる
    if let Some(authority) = req.uri().authority() {
        let value = HeaderValue::from_str(authority.as_str())
            .map_err(|e| GatewayError::BadTarget(format!("{}: {}", authority.as_str(), e)))?;
        req.headers_mut().insert(header::HOST, value);
    }

    let response = state.http_client.request(req).await.map_err(|e| {
        error!(target = %target_uri, error = %e, "proxy request failed");
        if e.is_connect() {
            GatewayError::UpstreamUnavailable(e.to_string())
        } else {
            GatewayError::UpstreamFailed(e.to_string())
        }
    })?;

    let (parts, body) = response.into_parts();
    Ok(Response::from_parts(parts, Body::new(body)))
}
