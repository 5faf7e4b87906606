use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::info;

use super::error::AppError;
use super::AppState;
use crate::domain::entity::user::{NewUser, User};
use cloakworks_auth::Claims;

#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Health check OK"),
    )
)]
pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[utoipa::path(
    get,
    path = "/readyz",
    responses(
        (status = 200, description = "Ready"),
        (status = 503, description = "Not ready"),
    )
)]
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let mut db_status = "skipped";
    let mut keycloak_status = "skipped";
    let mut overall_ok = true;

    // DB check
    if let Some(ref pool) = state.db_pool {
        match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => db_status = "ok",
            Err(_) => {
                db_status = "error";
                overall_ok = false;
            }
        }
    }

    // Keycloak check
    if let Some(ref url) = state.issuer_url {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(3))
            .build()
            .unwrap_or_default();
        match client.get(url).send().await {
            Ok(_) => keycloak_status = "ok",
            Err(_) => {
                keycloak_status = "error";
                overall_ok = false;
            }
        }
    }

    let status_code = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status_code,
        Json(serde_json::json!({
            "status": if overall_ok { "ready" } else { "not ready" },
            "checks": {
                "database": db_status,
                "keycloak": keycloak_status
            }
        })),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<User>>, AppError> {
    info!(username = %claims.username(), "list users requested");
    let users = state.user_repo.find_all().await?;
    Ok(Json(users))
}

/// 検証済みトークンのクレームをそのまま返す。
/// ミドルウェアが格納した Claims をボディにするだけで、
/// クレームの取捨選択は行わない。
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Claims of the authenticated caller"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn me(Extension(claims): Extension<Claims>) -> Json<Claims> {
    info!(username = %claims.username(), "claims echo requested");
    Json(claims)
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    match state.user_repo.find_by_id(id).await? {
        // 存在しない場合はボディ無しの 404 を返す
        Some(user) => Ok(Json(user).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    info!(username = %claims.username(), created = %new_user.username, "create user requested");
    let created = state.user_repo.save(new_user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::handler::router;
    use crate::domain::repository::user_repository::MockUserRepository;
    use crate::infrastructure::MockTokenVerifier;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn sample_claims() -> Claims {
        serde_json::from_value(serde_json::json!({
            "sub": "user-uuid-1234",
            "iss": "https://auth.example.com/realms/microservices",
            "exp": 4102444800u64,
            "iat": 1710000000u64,
            "preferred_username": "alice",
            "email": "alice@example.com",
            "custom_attribute": "kept-as-is"
        }))
        .unwrap()
    }

    fn verifier_accepting_all() -> MockTokenVerifier {
        let claims = sample_claims();
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify_token()
            .returning(move |_| Ok(claims.clone()));
        verifier
    }

    fn app_with_repo(repo: MockUserRepository) -> axum::Router {
        let state = AppState::new(
            Arc::new(verifier_accepting_all()),
            Arc::new(repo),
            None,
            None,
        );
        router(state)
    }

    fn authed_request(method: &str, uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", "Bearer valid-token")
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap()
    }

    fn sample_user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[tokio::test]
    async fn test_healthz_is_public() {
        let app = app_with_repo(MockUserRepository::new());
        let req = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_users_returns_collection() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_all()
            .returning(|| Ok(vec![sample_user(1, "alice"), sample_user(2, "bob")]));

        let app = app_with_repo(repo);
        let resp = app
            .oneshot(authed_request("GET", "/users", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["username"], "alice");
    }

    #[tokio::test]
    async fn test_me_returns_token_claims_verbatim() {
        // リポジトリは呼ばれない想定 (expect なし)
        let app = app_with_repo(MockUserRepository::new());
        let resp = app
            .oneshot(authed_request("GET", "/users/me", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["sub"], "user-uuid-1234");
        assert_eq!(json["preferred_username"], "alice");
        assert_eq!(json["email"], "alice@example.com");
        // 未知のクレームも落とさず返す
        assert_eq!(json["custom_attribute"], "kept-as-is");
    }

    #[tokio::test]
    async fn test_get_user_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .withf(|id| *id == 1)
            .returning(|_| Ok(Some(sample_user(1, "alice"))));

        let app = app_with_repo(repo);
        let resp = app
            .oneshot(authed_request("GET", "/users/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["username"], "alice");
    }

    #[tokio::test]
    async fn test_get_user_not_found_has_empty_body() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let app = app_with_repo(repo);
        let resp = app
            .oneshot(authed_request("GET", "/users/999", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_returns_created_with_persisted_body() {
        let mut repo = MockUserRepository::new();
        repo.expect_save().returning(|new| {
            Ok(User {
                id: 7,
                username: new.username,
                email: new.email,
                first_name: new.first_name,
                last_name: new.last_name,
            })
        });

        let app = app_with_repo(repo);
        let body = Body::from(
            r#"{"username": "carol", "email": "carol@example.com", "first_name": "Carol", "last_name": "Doe"}"#,
        );
        let resp = app
            .oneshot(authed_request("POST", "/users", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        // 送ったボディ + サーバー採番 id が返る
        assert_eq!(json["id"], 7);
        assert_eq!(json["username"], "carol");
        assert_eq!(json["email"], "carol@example.com");
    }

    #[tokio::test]
    async fn test_unauthenticated_request_never_touches_repository() {
        // リポジトリに expect を設定しない = 呼ばれたらテスト失敗
        let app = app_with_repo(MockUserRepository::new());
        let req = Request::builder()
            .method("GET")
            .uri("/users")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_storage_failure_maps_to_500() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_all()
            .returning(|| Err(anyhow::anyhow!("connection refused")));

        let app = app_with_repo(repo);
        let resp = app
            .oneshot(authed_request("GET", "/users", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "USER_INTERNAL_ERROR");
    }
}
