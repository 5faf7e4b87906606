//! JWKS 検証器: HTTP で公開鍵を取得しキャッシュ、JWT トークンを検証する。

use crate::claims::Claims;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// AuthError は認証エラーを表す。
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("JWKS fetch failed: {0}")]
    JwksFetchFailed(String),

    #[error("missing Authorization header")]
    MissingToken,

    #[error("invalid Authorization header format")]
    InvalidAuthHeader,
}

/// JWKS レスポンスの構造体。
#[derive(Debug, Clone, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// 個々の JWK 鍵。
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    #[allow(dead_code)]
    kty: String,
    n: String,
    e: String,
}

/// JwksFetcher は JWKS エンドポイントからの鍵取得を抽象化するトレイト。
#[async_trait::async_trait]
pub trait JwksFetcher: Send + Sync {
    async fn fetch_keys(&self, jwks_url: &str) -> Result<Vec<JwkKey>, AuthError>;
}

/// JwkKey は取得した JWK 鍵の公開情報。
#[derive(Debug, Clone)]
pub struct JwkKey {
    pub kid: String,
    pub n: String,
    pub e: String,
}

/// DefaultJwksFetcher は HTTP 経由で JWKS を取得するデフォルト実装。
pub struct DefaultJwksFetcher {
    client: reqwest::Client,
}

impl DefaultJwksFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(3))
                .build()
                .unwrap_or_default(),
        }
    }

    /// 開発専用: TLS 証明書検証を行わないクライアントで JWKS を取得する。
    ///
    /// 自己署名証明書の Keycloak に対するローカル動作確認のためだけのもの。
    /// feature `dev-insecure-tls` を有効にしたビルドでのみ存在し、
    /// 本番ビルドに含めてはならない。
    #[cfg(feature = "dev-insecure-tls")]
    pub fn insecure() -> Result<Self, AuthError> {
        tracing::warn!(
            "JWKS fetcher built WITHOUT TLS certificate verification (dev-insecure-tls)"
        );
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| AuthError::JwksFetchFailed(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Default for DefaultJwksFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl JwksFetcher for DefaultJwksFetcher {
    async fn fetch_keys(&self, jwks_url: &str) -> Result<Vec<JwkKey>, AuthError> {
        let resp = self
            .client
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AuthError::JwksFetchFailed(format!(
                "JWKS endpoint returned non-success status: {status}"
            )));
        }

        let body: JwksResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::JwksFetchFailed(e.to_string()))?;

        Ok(body
            .keys
            .into_iter()
            .map(|k| JwkKey {
                kid: k.kid,
                n: k.n,
                e: k.e,
            })
            .collect())
    }
}

/// JWKS キャッシュ。
struct JwksCache {
    keys: Vec<JwkKey>,
    fetched_at: Instant,
}

/// JwksVerifier は JWKS エンドポイントから公開鍵を取得し、JWT トークンを検証する。
pub struct JwksVerifier {
    jwks_url: String,
    issuer: String,
    audience: Option<String>,
    cache_ttl: Duration,
    cache: Arc<RwLock<Option<JwksCache>>>,
    fetcher: Arc<dyn JwksFetcher>,
}

impl JwksVerifier {
    /// 新しい JwksVerifier を生成する。
    ///
    /// issuer は常に検証する。audience は指定された場合のみ検証する
    /// （Keycloak のデフォルト設定ではクライアントごとの aud を持たないため）。
    pub fn new(
        jwks_url: &str,
        issuer: &str,
        audience: Option<&str>,
        cache_ttl: Duration,
    ) -> Self {
        Self::with_fetcher(
            jwks_url,
            issuer,
            audience,
            cache_ttl,
            Arc::new(DefaultJwksFetcher::new()),
        )
    }

    /// カスタムフェッチャーを使う JwksVerifier を生成する。
    pub fn with_fetcher(
        jwks_url: &str,
        issuer: &str,
        audience: Option<&str>,
        cache_ttl: Duration,
        fetcher: Arc<dyn JwksFetcher>,
    ) -> Self {
        Self {
            jwks_url: jwks_url.to_string(),
            issuer: issuer.to_string(),
            audience: audience.map(str::to_string),
            cache_ttl,
            cache: Arc::new(RwLock::new(None)),
            fetcher,
        }
    }

    /// 検証対象の JWKS URL を返す。
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// JWT トークン文字列を検証し、Claims を返す。
    pub async fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let keys = self.get_keys().await?;

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("missing kid in header".into()))?;

        let jwk = keys
            .iter()
            .find(|k| k.kid == kid)
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown kid: {}", kid)))?;

        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }

    /// キャッシュから鍵を取得する。TTL を超えている場合は再取得する。
    async fn get_keys(&self) -> Result<Vec<JwkKey>, AuthError> {
        // Read lock でキャッシュを確認
        {
            let cache = self.cache.read().await;
            if let Some(ref c) = *cache {
                if c.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(c.keys.clone());
                }
            }
        }

        // Write lock で再取得
        let mut cache = self.cache.write().await;

        // ダブルチェック
        if let Some(ref c) = *cache {
            if c.fetched_at.elapsed() < self.cache_ttl {
                return Ok(c.keys.clone());
            }
        }

        let keys = self.fetcher.fetch_keys(&self.jwks_url).await?;

        *cache = Some(JwksCache {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });

        Ok(keys)
    }

    /// キャッシュを無効化する。鍵ローテーション時に使用。
    pub async fn invalidate_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}
