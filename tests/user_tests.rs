use custodia::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_and_fetch_user() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/users"),
            &token,
            &json!({"name": "Luis", "email": "luis@example.com", "password": "secret1", "phone": "555-0101"})
                .to_string(),
        )
        .await;
    assert_eq!(res.status, 201, "body: {}", res.body);
    let id = res.data()["id"].as_str().unwrap().to_string();
    assert!(res.data().get("password").is_none());

    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/users/{}", id)), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["phone"], "555-0101");
}

#[tokio::test]
async fn management_routes_require_auth() {
    let app = TestApp::new().await;

    let res = app.client.get(&app.url("/api/users")).await;
    assert_eq!(res.status, 401);

    let res = app
        .client
        .post(&app.url("/api/roles"), &json!({"name": "editor"}).to_string())
        .await;
    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn list_filters_by_search_and_active() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    app.register_user("Luis", "luis@example.com", "secret1").await;
    app.register_user("Lucia", "lucia@example.com", "secret1").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/users?search=lu"), &token)
        .await;
    assert_eq!(res.status, 200);
    let data = res.data();
    assert_eq!(data["total"], 2);
    assert_eq!(data["data"].as_array().unwrap().len(), 2);

    let res = app
        .client
        .get_with_auth(&app.url("/api/users?is_active=false"), &token)
        .await;
    assert_eq!(res.data()["total"], 0);
}

#[tokio::test]
async fn update_rehashes_password() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let id = user["id"].as_str().unwrap();

    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/users/{}", id)),
            &token,
            &json!({"password": "newpass1"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);

    // Old password no longer works, new one does.
    let res = app
        .post(
            "/api/auth/login",
            &json!({"email": "ana@example.com", "password": "secret1"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 401);
    app.login("ana@example.com", "newpass1").await;
}

#[tokio::test]
async fn update_rejects_taken_email() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    app.register_user("Luis", "luis@example.com", "secret1").await;
    let id = user["id"].as_str().unwrap();

    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/users/{}", id)),
            &token,
            &json!({"email": "luis@example.com"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 409);
}

#[tokio::test]
async fn missing_user_is_404() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Ana", "ana@example.com", "secret1").await;

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/users/{}", uuid::Uuid::new_v4())),
            &token,
        )
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.json()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn deactivated_user_stays_listed_as_inactive() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    let (_, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let id = user["id"].as_str().unwrap();

    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/users/{}", id)), &token)
        .await;
    assert_eq!(res.status, 204);

    // Soft delete: the row survives with is_active=false.
    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/users/{}", id)), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["is_active"], false);

    let res = app
        .client
        .get_with_auth(&app.url("/api/users?is_active=false"), &token)
        .await;
    assert_eq!(res.data()["total"], 1);
}
