//! JWT Claims 構造体（Keycloak 発行トークン準拠）。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// RealmAccess は Keycloak の realm_access Claim を表す。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Access はリソースアクセスのロール一覧を表す。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Access {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Claims は JWT トークンの Claims 構造体。
///
/// 型付きフィールドに現れない Claim は `extra` にそのまま保持されるため、
/// 検証済みトークンの Claims 一式を欠落なくレスポンスとして返すことができる。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// ユーザーの一意識別子（UUID）
    pub sub: String,

    /// トークン発行者
    pub iss: String,

    /// トークンの対象オーディエンス
    #[serde(default, skip_serializing_if = "Audience::is_empty")]
    pub aud: Audience,

    /// トークンの有効期限（Unix タイムスタンプ）
    pub exp: u64,

    /// トークンの発行時刻（Unix タイムスタンプ）
    pub iat: u64,

    /// JWT ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// トークン種別
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// Authorized party
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,

    /// スコープ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// ユーザー名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    /// メールアドレス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// グローバルロール
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_access: Option<RealmAccess>,

    /// サービス固有のロール
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_access: Option<HashMap<String, Access>>,

    /// 型付きフィールドに現れないその他の Claim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// ログ出力に使うユーザー名。preferred_username が無い場合は sub を返す。
    pub fn username(&self) -> &str {
        self.preferred_username.as_deref().unwrap_or(&self.sub)
    }
}

/// Audience は JWT の aud Claim を表す。
/// 文字列または文字列配列のどちらも受け付け、シリアライズ時は
/// 受け取った形を保てるよう単一要素なら文字列として出力する。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Audience(pub Vec<String>);

impl Audience {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Audience {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if self.0.len() == 1 {
            serializer.serialize_str(&self.0[0])
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct AudienceVisitor;

        impl<'de> de::Visitor<'de> for AudienceVisitor {
            type Value = Audience;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string or array of strings")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Audience(vec![v.to_string()]))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut values = Vec::new();
                while let Some(v) = seq.next_element::<String>()? {
                    values.push(v);
                }
                Ok(Audience(values))
            }
        }

        deserializer.deserialize_any(AudienceVisitor)
    }
}
