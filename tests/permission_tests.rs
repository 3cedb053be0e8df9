use custodia::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_permission_and_reject_duplicates() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/permissions"),
            &token,
            &json!({"name": "users:read", "resource": "users", "action": "read"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 201, "body: {}", res.body);

    // Same name
    let res = app
        .client
        .post_with_auth(
            &app.url("/api/permissions"),
            &token,
            &json!({"name": "users:read", "resource": "reports", "action": "read"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 409);

    // Same (resource, action) pair under a different name
    let res = app
        .client
        .post_with_auth(
            &app.url("/api/permissions"),
            &token,
            &json!({"name": "read-users", "resource": "users", "action": "read"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 409);
    assert!(res.error_message().contains("resource"));
}

#[tokio::test]
async fn update_keeps_pair_unique() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    app.create_permission(&token, "users:read", "users", "read").await;
    let id = app.create_permission(&token, "users:write", "users", "write").await;

    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/permissions/{}", id)),
            &token,
            &json!({"action": "read"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 409);

    // Moving to a free pair is fine.
    let res = app
        .client
        .patch_with_auth(
            &app.url(&format!("/api/permissions/{}", id)),
            &token,
            &json!({"resource": "reports"}).to_string(),
        )
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);
    assert_eq!(res.data()["resource"], "reports");
}

#[tokio::test]
async fn list_is_ordered_by_resource_then_action() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    app.create_permission(&token, "users:write", "users", "write").await;
    app.create_permission(&token, "reports:read", "reports", "read").await;
    app.create_permission(&token, "users:read", "users", "read").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/permissions"), &token)
        .await;
    let data = res.data();
    let pairs: Vec<(String, String)> = data["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| {
            (
                p["resource"].as_str().unwrap().to_string(),
                p["action"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("reports".into(), "read".into()),
            ("users".into(), "read".into()),
            ("users".into(), "write".into()),
        ]
    );
}

#[tokio::test]
async fn list_supports_exact_filters() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    app.create_permission(&token, "users:read", "users", "read").await;
    app.create_permission(&token, "users:write", "users", "write").await;
    app.create_permission(&token, "reports:read", "reports", "read").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/permissions?resource=users"), &token)
        .await;
    assert_eq!(res.data()["total"], 2);

    let res = app
        .client
        .get_with_auth(&app.url("/api/permissions?action=read"), &token)
        .await;
    assert_eq!(res.data()["total"], 2);

    let res = app
        .client
        .get_with_auth(
            &app.url("/api/permissions?resource=users&action=read"),
            &token,
        )
        .await;
    assert_eq!(res.data()["total"], 1);
}

#[tokio::test]
async fn distinct_resources_and_actions() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    app.create_permission(&token, "users:read", "users", "read").await;
    app.create_permission(&token, "users:write", "users", "write").await;
    app.create_permission(&token, "reports:read", "reports", "read").await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/permissions/resources"), &token)
        .await;
    assert_eq!(res.data(), json!(["reports", "users"]));

    let res = app
        .client
        .get_with_auth(&app.url("/api/permissions/actions"), &token)
        .await;
    assert_eq!(res.data(), json!(["read", "write"]));
}

#[tokio::test]
async fn deactivate_is_blocked_while_active_roles_hold_the_grant() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    let role_id = app.create_role(&token, "editor").await;
    let perm_id = app.create_permission(&token, "users:read", "users", "read").await;

    app.client
        .post_with_auth(
            &app.url("/api/role-permissions/assign"),
            &token,
            &json!({"role_id": role_id, "permission_ids": [perm_id]}).to_string(),
        )
        .await;

    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/permissions/{}", perm_id)), &token)
        .await;
    assert_eq!(res.status, 400);
    assert!(res.error_message().contains("active role"));

    app.client
        .post_with_auth(
            &app.url("/api/role-permissions/remove"),
            &token,
            &json!({"role_id": role_id, "permission_ids": [perm_id]}).to_string(),
        )
        .await;

    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/permissions/{}", perm_id)), &token)
        .await;
    assert_eq!(res.status, 204);
}
