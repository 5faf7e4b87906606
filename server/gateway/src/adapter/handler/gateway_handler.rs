use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::AppState;

pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// readyz は issuer (Keycloak) への疎通を確認する。
/// ゲートウェイ自身は DB を持たない。
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let mut keycloak_status = "skipped";
    let mut overall_ok = true;

    if let Some(ref url) = state.issuer_url {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()
            .unwrap_or_default();
        match client.get(url).send().await {
            Ok(_) => keycloak_status = "ok",
            Err(_) => {
                keycloak_status = "error";
                overall_ok = false;
            }
        }
    }

    let status_code = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status_code,
        Json(serde_json::json!({
            "status": if overall_ok { "ready" } else { "not ready" },
            "checks": {
                "keycloak": keycloak_status
            }
        })),
    )
        .into_response()
}
