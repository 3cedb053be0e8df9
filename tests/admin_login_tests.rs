use custodia::TestApp;
use serde_json::json;

#[tokio::test]
async fn gated_login_rejects_users_without_the_admin_role() {
    let app = TestApp::new_admin_gated().await;
    app.register_user("Ana", "ana@example.com", "secret1").await;

    let res = app
        .post(
            "/api/auth/login",
            &json!({"email": "ana@example.com", "password": "secret1"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 401);
    // Distinct from the opaque credential failure: the account is fine,
    // it just lacks the required role.
    assert!(res.error_message().contains("permission"));
}

#[tokio::test]
async fn gated_login_admits_admins() {
    let app = TestApp::new_admin_gated().await;
    // Registration still issues a token even under the gate.
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;

    let admin_role = app.create_role(&token, "administrador").await;
    app.client
        .post_with_auth(
            &app.url("/api/user-roles/assign"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [admin_role]}).to_string(),
        )
        .await;

    let token = app.login("ana@example.com", "secret1").await;
    let claims = custodia::auth::validate_token(&token, &app.config.jwt_secret).unwrap();
    assert!(claims.roles.unwrap().contains(&"administrador".to_string()));
}

#[tokio::test]
async fn gated_login_ignores_a_deactivated_admin_assignment() {
    let app = TestApp::new_admin_gated().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;

    let admin_role = app.create_role(&token, "administrador").await;
    app.client
        .post_with_auth(
            &app.url("/api/user-roles/assign"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [admin_role]}).to_string(),
        )
        .await;
    app.client
        .post_with_auth(
            &app.url("/api/user-roles/deactivate"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [admin_role]}).to_string(),
        )
        .await;

    let res = app
        .post(
            "/api/auth/login",
            &json!({"email": "ana@example.com", "password": "secret1"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn open_login_needs_no_role() {
    let app = TestApp::new().await;
    app.register_user("Ana", "ana@example.com", "secret1").await;
    app.login("ana@example.com", "secret1").await;
}

#[tokio::test]
async fn registration_grants_the_default_role() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/users/{}/roles", user["id"].as_str().unwrap())),
            &token,
        )
        .await;
    assert_eq!(res.status, 200);
    let data = res.data();
    let names: Vec<&str> = data["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["usuario"]);
}

#[tokio::test]
async fn registration_with_explicit_roles_skips_the_default() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    let editor = app.create_role(&token, "editor").await;

    let res = app
        .post(
            "/api/auth/register",
            &json!({
                "name": "Luis",
                "email": "luis@example.com",
                "password": "secret1",
                "role_ids": [editor],
            })
            .to_string(),
        )
        .await;
    assert_eq!(res.status, 201, "body: {}", res.body);
    let user_id = res.data()["user"]["id"].as_str().unwrap().to_string();

    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/users/{}/roles", user_id)), &token)
        .await;
    let data = res.data();
    let names: Vec<&str> = data["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["editor"]);
}

#[tokio::test]
async fn registration_rejects_unknown_role_ids() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/auth/register",
            &json!({
                "name": "Luis",
                "email": "luis@example.com",
                "password": "secret1",
                "role_ids": [uuid::Uuid::new_v4()],
            })
            .to_string(),
        )
        .await;
    assert_eq!(res.status, 404);
    assert!(res.error_message().contains("not found or are inactive"));
}
