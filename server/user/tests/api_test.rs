//! End-to-end tests: wiremock の JWKS エンドポイントと実署名トークンで
//! ルーター全体（認証ミドルウェア込み）の動作を確認する。

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cloakworks_auth::{issuer, JwksVerifier};
use cloakworks_user_server::adapter::handler::{router, AppState};
use cloakworks_user_server::domain::entity::user::{NewUser, User};
use cloakworks_user_server::domain::repository::UserRepository;
use cloakworks_user_server::infrastructure::JwksVerifierAdapter;

const TEST_KID: &str = "it-key-1";

/// インメモリのリポジトリ実装。DB なしでルーター全体を動かすために使う。
struct InMemoryUserRepository {
    items: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.items.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn save(&self, user: NewUser) -> anyhow::Result<User> {
        let mut items = self.items.lock().unwrap();
        let created = User {
            id: items.len() as i64 + 1,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        };
        items.push(created.clone());
        Ok(created)
    }
}

fn generate_keypair() -> (RsaPrivateKey, serde_json::Value) {
    let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
    let public_key = private_key.to_public_key();

    let jwks = serde_json::json!({
        "keys": [{
            "kid": TEST_KID,
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }]
    });

    (private_key, jwks)
}

/// 任意のクレーム集合で署名する。verbatim 比較のテストに使う。
fn sign_token_with_claims(private_key: &RsaPrivateKey, claims: &serde_json::Value) -> String {
    let pem = private_key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .unwrap();
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    encode(&header, claims, &key).unwrap()
}

fn sign_token(private_key: &RsaPrivateKey, iss: &str, username: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = serde_json::json!({
        "sub": "user-uuid-1234",
        "iss": iss,
        "exp": now + 3600,
        "iat": now,
        "preferred_username": username,
    });
    sign_token_with_claims(private_key, &claims)
}

/// wiremock の JWKS エンドポイントを立て、そこを信頼するルーターを構築する。
async fn setup() -> (axum::Router, RsaPrivateKey, String, MockServer) {
    let (private_key, jwks) = generate_keypair();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/realms/demo/protocol/openid-connect/certs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
        .mount(&mock_server)
        .await;

    let iss = format!("{}/realms/demo", mock_server.uri());
    let verifier = Arc::new(JwksVerifier::new(
        &issuer::jwks_url(&iss),
        &iss,
        None,
        Duration::from_secs(60),
    ));

    let state = AppState::new(
        Arc::new(JwksVerifierAdapter::new(verifier)),
        Arc::new(InMemoryUserRepository::new()),
        None,
        None,
    );

    (router(state), private_key, iss, mock_server)
}

#[tokio::test]
async fn test_full_create_then_get_roundtrip() {
    let (app, private_key, iss, _server) = setup().await;
    let token = sign_token(&private_key, &iss, "alice");

    // POST /users
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"username": "bob", "email": "bob@example.com", "first_name": "Bob", "last_name": "Builder"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created["username"], "bob");
    let id = created["id"].as_i64().unwrap();

    // GET /users/{id}
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/users/{}", id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let fetched: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_me_echoes_signed_claims_verbatim() {
    let (app, private_key, iss, _server) = setup().await;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    // 標準クレームに加えて Keycloak 固有・カスタム属性も混ぜる
    let signed_claims = serde_json::json!({
        "sub": "user-uuid-9999",
        "iss": iss,
        "exp": now + 3600,
        "iat": now,
        "preferred_username": "carol",
        "email": "carol@example.com",
        "realm_access": {"roles": ["user", "offline_access"]},
        "department": "engineering",
        "clearance_level": 3,
    });
    let token = sign_token_with_claims(&private_key, &signed_claims);

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/users/me")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let echoed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    // トークンで署名したクレーム集合がそのまま返る
    assert_eq!(echoed, signed_claims);
}

#[tokio::test]
async fn test_missing_user_returns_404_empty_body() {
    let (app, private_key, iss, _server) = setup().await;
    let token = sign_token(&private_key, &iss, "alice");

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/users/12345")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_request_without_token_is_rejected() {
    let (app, _private_key, _iss, _server) = setup().await;

    let resp = app
        .oneshot(Request::builder().uri("/users").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_untrusted_key_is_rejected() {
    let (app, _private_key, iss, _server) = setup().await;

    // JWKS に載っていない鍵で署名する
    let (rogue_key, _jwks) = generate_keypair();
    let token = sign_token(&rogue_key, &iss, "mallory");

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/users/me")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
