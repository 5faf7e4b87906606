//! cloakworks-user-server: User エンティティの CRUD と `/users/me` を提供する
//! リソースサービス。
//!
//! すべてのリソースルートは Keycloak 発行の Bearer トークン検証を通過した
//! リクエストのみ処理する。`/users/me` は検証済みトークンの Claims 一式を
//! そのまま返す。

pub mod adapter;
pub mod domain;
pub mod infrastructure;
