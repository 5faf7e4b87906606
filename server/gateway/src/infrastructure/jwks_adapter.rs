use std::sync::Arc;

use async_trait::async_trait;

use crate::infrastructure::TokenVerifier;
use cloakworks_auth::{Claims, JwksVerifier};

/// JwksVerifierAdapter はライブラリの JwksVerifier をゲートウェイの TokenVerifier に適合させる。
pub struct JwksVerifierAdapter {
    verifier: Arc<JwksVerifier>,
}

impl JwksVerifierAdapter {
    pub fn new(verifier: Arc<JwksVerifier>) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifierAdapter {
    async fn verify_token(&self, token: &str) -> anyhow::Result<Claims> {
        self.verifier
            .verify_token(token)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}
