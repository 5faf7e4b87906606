//! Issuer URL の解決と JWKS URL の導出。

/// Issuer URL を上書きする環境変数名。
pub const ISSUER_ENV: &str = "KEYCLOAK_ISSUER_URI";

/// クラスタ内 Keycloak のデフォルト Issuer URL。
pub const DEFAULT_ISSUER: &str =
    "http://keycloak.keycloak.svc.cluster.local:8080/realms/microservices";

/// OpenID Connect の JWKS エンドポイントパス。
const JWKS_PATH: &str = "/protocol/openid-connect/certs";

/// Issuer URL を解決する。
///
/// 優先順位: `KEYCLOAK_ISSUER_URI` 環境変数（非空のとき） > 設定ファイルの値
/// （非空のとき） > クラスタ内デフォルト。
pub fn resolve_issuer(configured: Option<&str>) -> String {
    match std::env::var(ISSUER_ENV) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => configured
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
    }
}

/// Issuer URL から JWKS エンドポイント URL を導出する。
pub fn jwks_url(issuer: &str) -> String {
    format!("{}{}", issuer.trim_end_matches('/'), JWKS_PATH)
}
