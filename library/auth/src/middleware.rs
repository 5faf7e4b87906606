//! 認証ミドルウェアの部品。Bearer トークンの取り出しを提供する。

use crate::verifier::AuthError;
use http::Request;

/// Bearer トークンを Authorization ヘッダーから取得する。
///
/// ヘッダーが無い・トークンが空の場合は `MissingToken`、
/// Bearer 以外のスキームの場合は `InvalidAuthHeader` を返す。
pub fn extract_bearer_token<B>(req: &Request<B>) -> Result<String, AuthError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let parts: Vec<&str> = auth_header.splitn(2, ' ').collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts[1].trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.to_string())
}
