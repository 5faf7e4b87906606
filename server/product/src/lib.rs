//! cloakworks-product-server: Product エンティティの CRUD を提供するリソースサービス。
//!
//! すべてのリソースルートは Keycloak 発行の Bearer トークン検証を通過した
//! リクエストのみ処理する。

pub mod adapter;
pub mod domain;
pub mod infrastructure;
