//! cloakworks-auth: Keycloak JWT の JWKS 検証ライブラリ
//!
//! JWKS エンドポイントから公開鍵を取得し、JWT の署名検証を行う。
//! Keycloak が発行するトークンの Claims 構造に準拠する。
//!
//! # 使い方
//!
//! ```ignore
//! use cloakworks_auth::{issuer, JwksVerifier};
//! use std::time::Duration;
//!
//! let iss = issuer::resolve_issuer(None);
//! let verifier = JwksVerifier::new(
//!     &issuer::jwks_url(&iss),
//!     &iss,
//!     None,
//!     Duration::from_secs(600),
//! );
//!
//! let claims = verifier.verify_token("eyJ...").await?;
//! ```

pub mod claims;
pub mod issuer;
pub mod middleware;
pub mod verifier;

pub use claims::{Audience, Claims};
pub use middleware::extract_bearer_token;
pub use verifier::{AuthError, JwksVerifier};
