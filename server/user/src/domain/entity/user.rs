use serde::{Deserialize, Serialize};

/// User はストアに保存されるユーザーを表すドメインエンティティ。
/// id はデータベースが採番する。Keycloak 上のアカウントとは独立した
/// アプリケーション側のレコードであることに注意。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// NewUser は作成リクエストのボディを表す。id を持たない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}
