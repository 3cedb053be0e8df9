use custodia::TestApp;
use serde_json::json;

#[tokio::test]
async fn register_returns_token_and_strips_password() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/auth/register",
            &json!({"name": "Ana", "email": "ana@example.com", "password": "secret1"}).to_string(),
        )
        .await;

    assert_eq!(res.status, 201, "body: {}", res.body);
    let data = res.data();
    assert!(data["token"].as_str().is_some());
    assert_eq!(data["user"]["email"], "ana@example.com");
    assert!(data["user"].get("password").is_none());
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = TestApp::new().await;
    app.register_user("Ana", "ana@example.com", "secret1").await;

    let res = app
        .post(
            "/api/auth/register",
            &json!({"name": "Other", "email": "ana@example.com", "password": "secret1"}).to_string(),
        )
        .await;

    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/auth/register",
            &json!({"name": "Ana", "email": "not-an-email", "password": "123"}).to_string(),
        )
        .await;

    assert_eq!(res.status, 400);
    let error = res.json()["error"].clone();
    assert_eq!(error["code"], "VALIDATION_ERROR");
    let fields = error["fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["field"] == "email"));
    assert!(fields.iter().any(|f| f["field"] == "password"));
}

#[tokio::test]
async fn login_succeeds_and_token_carries_roles() {
    let app = TestApp::new().await;
    app.register_user("Ana", "ana@example.com", "secret1").await;

    let res = app
        .post(
            "/api/auth/login",
            &json!({"email": "ana@example.com", "password": "secret1"}).to_string(),
        )
        .await;

    assert_eq!(res.status, 200, "body: {}", res.body);
    let token = res.data()["token"].as_str().unwrap().to_string();

    let claims = custodia::auth::validate_token(&token, &app.config.jwt_secret).unwrap();
    assert_eq!(claims.email, "ana@example.com");
    assert_eq!(claims.roles.unwrap(), vec!["usuario"]);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;

    // Wrong password
    let res = app
        .post(
            "/api/auth/login",
            &json!({"email": "ana@example.com", "password": "wrong-1"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 401);
    let wrong_password = res.error_message();

    // Unknown email
    let res = app
        .post(
            "/api/auth/login",
            &json!({"email": "ghost@example.com", "password": "secret1"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.error_message(), wrong_password);

    // Deactivated account
    let user_id = user["id"].as_str().unwrap();
    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/users/{}", user_id)), &token)
        .await;
    assert_eq!(res.status, 204);

    let res = app
        .post(
            "/api/auth/login",
            &json!({"email": "ana@example.com", "password": "secret1"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.error_message(), wrong_password);
}

#[tokio::test]
async fn profile_round_trip() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/profile"), &token)
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.data()["id"], user["id"]);
    assert_eq!(res.data()["email"], "ana@example.com");
}

#[tokio::test]
async fn profile_requires_token() {
    let app = TestApp::new().await;

    let res = app.client.get(&app.url("/api/auth/profile")).await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Ana", "ana@example.com", "secret1").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/profile"), &format!("{}x", token))
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let app = TestApp::new().await;
    let (_, user) = app.register_user("Ana", "ana@example.com", "secret1").await;

    let now = chrono::Utc::now();
    let claims = custodia::auth::Claims {
        sub: user["id"].as_str().unwrap().to_string(),
        email: "ana@example.com".to_string(),
        roles: None,
        exp: (now - chrono::Duration::hours(1)).timestamp() as usize,
        iat: (now - chrono::Duration::hours(2)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.config.jwt_secret.as_bytes()),
    )
    .unwrap();

    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/profile"), &token)
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn stale_token_of_deactivated_user_fails_closed() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let user_id = user["id"].as_str().unwrap();

    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/users/{}", user_id)), &token)
        .await;
    assert_eq!(res.status, 204);

    // The token is still signed and unexpired, but the subject is gone.
    let res = app
        .client
        .get_with_auth(&app.url("/api/auth/profile"), &token)
        .await;
    assert_eq!(res.status, 401);
}
