//! cloakworks-gateway: 認証付きリバースプロキシ
//!
//! Keycloak 発行の Bearer トークンを JWKS で検証し、パスのプレフィックスに
//! 応じてリソースサーバーへリクエストを転送するエッジサービス。
//! 未認証のトラフィックはアップストリームに到達しない。

pub mod adapter;
pub mod infrastructure;
