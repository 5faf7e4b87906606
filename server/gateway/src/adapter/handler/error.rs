use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::ErrorResponse;

/// GatewayError はプロキシ転送で起こりうる失敗を表す。
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no route configured for path {0}")]
    NoRoute(String),
    #[error("upstream target URI is invalid: {0}")]
    BadTarget(String),
    #[error("upstream connection failed: {0}")]
    UpstreamUnavailable(String),
    #[error("upstream request failed: {0}")]
    UpstreamFailed(String),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoRoute(_) => StatusCode::NOT_FOUND,
            GatewayError::BadTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            GatewayError::NoRoute(_) => "GW_NO_ROUTE",
            GatewayError::BadTarget(_) => "GW_BAD_TARGET",
            GatewayError::UpstreamUnavailable(_) => "GW_UPSTREAM_UNAVAILABLE",
            GatewayError::UpstreamFailed(_) => "GW_UPSTREAM_ERROR",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.code(), &self.to_string());
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_error_statuses() {
        assert_eq!(
            GatewayError::NoRoute("/orders".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::UpstreamUnavailable("refused".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::UpstreamFailed("reset".into()).status(),
            StatusCode::BAD_GATEWAY
        );

        let resp = GatewayError::NoRoute("/orders".into()).into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "GW_NO_ROUTE");
        assert!(json["error"]["request_id"].is_string());
    }
}
