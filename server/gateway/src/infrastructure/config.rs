use serde::Deserialize;

/// Application configuration for the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// 設定された host と port から待ち受けアドレスを組み立てる。
    pub fn bind_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid server.host/port: {e}"))
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// AuthConfig は JWT 認証の設定を表す。
///
/// issuer は `KEYCLOAK_ISSUER_URI` 環境変数で上書きでき、どちらも無い場合は
/// クラスタ内デフォルトが使われる。JWKS URL は issuer から導出する。
///
/// `insecure_skip_tls_verify` は自己署名証明書の Keycloak を使う開発環境向け。
/// 有効化にはビルド時の `dev-insecure-tls` feature も必要で、
/// feature 無しのバイナリではフラグを立てると起動エラーになる。
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default = "default_jwks_cache_ttl_secs")]
    pub jwks_cache_ttl_secs: u64,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

fn default_jwks_cache_ttl_secs() -> u64 {
    3600
}

/// RouteConfig はパスプレフィックスと転送先アップストリームの対応を表す。
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub prefix: String,
    pub upstream: String,
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            prefix: "/products".to_string(),
            upstream: "http://localhost:8081".to_string(),
        },
        RouteConfig {
            prefix: "/users".to_string(),
            upstream: "http://localhost:8082".to_string(),
        },
    ]
}
