use custodia::TestApp;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn assign_and_fetch_effective_roles() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let editor = app.create_role(&token, "editor").await;
    let viewer = app.create_role(&token, "viewer").await;

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/user-roles/assign"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor, viewer]}).to_string(),
        )
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/users/{}/roles", user["id"].as_str().unwrap())),
            &token,
        )
        .await;
    let data = res.data();
    let names: Vec<&str> = data["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    // "usuario" was granted at registration.
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"editor"));
    assert!(names.contains(&"viewer"));
    assert!(names.contains(&"usuario"));
}

#[tokio::test]
async fn assign_rejects_unknown_or_inactive_roles() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let ghost = Uuid::new_v4();

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/user-roles/assign"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [ghost]}).to_string(),
        )
        .await;
    assert_eq!(res.status, 404);
    assert!(res.error_message().contains("not found or are inactive"));
    assert!(res.error_message().contains(&ghost.to_string()));
}

#[tokio::test]
async fn assign_rejects_fully_duplicate_request() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let editor = app.create_role(&token, "editor").await;

    let body = json!({"user_id": user["id"], "role_ids": [editor]}).to_string();
    let res = app
        .client
        .post_with_auth(&app.url("/api/user-roles/assign"), &token, &body)
        .await;
    assert_eq!(res.status, 200);

    let res = app
        .client
        .post_with_auth(&app.url("/api/user-roles/assign"), &token, &body)
        .await;
    assert_eq!(res.status, 409);
    assert!(res.error_message().contains("already assigned"));
}

#[tokio::test]
async fn remove_deletes_rows_and_reports_partial_matches() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let user_id: Uuid = user["id"].as_str().unwrap().parse().unwrap();
    let editor = app.create_role(&token, "editor").await;
    let viewer = app.create_role(&token, "viewer").await;

    app.client
        .post_with_auth(
            &app.url("/api/user-roles/assign"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor]}).to_string(),
        )
        .await;

    // viewer was never assigned: partial match is an error, nothing deleted.
    let res = app
        .client
        .post_with_auth(
            &app.url("/api/user-roles/remove"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor, viewer]}).to_string(),
        )
        .await;
    assert_eq!(res.status, 404);
    assert!(res.error_message().contains(&viewer));

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/user-roles/remove"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor]}).to_string(),
        )
        .await;
    assert_eq!(res.status, 200);

    // Hard removal: the join row is gone.
    let editor_id: Uuid = editor.parse().unwrap();
    let remaining = custodia::models::user_role::Entity::find()
        .filter(custodia::models::user_role::Column::UserId.eq(user_id))
        .filter(custodia::models::user_role::Column::RoleId.eq(editor_id))
        .all(&app.db)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn remove_with_nothing_assigned_is_not_found() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let editor = app.create_role(&token, "editor").await;

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/user-roles/remove"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor]}).to_string(),
        )
        .await;
    assert_eq!(res.status, 404);
    assert!(res.error_message().contains("None of the specified roles"));
}

#[tokio::test]
async fn deactivate_keeps_the_row_but_revokes_the_role() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let user_id: Uuid = user["id"].as_str().unwrap().parse().unwrap();
    let editor = app.create_role(&token, "editor").await;
    let editor_id: Uuid = editor.parse().unwrap();

    app.client
        .post_with_auth(
            &app.url("/api/user-roles/assign"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor]}).to_string(),
        )
        .await;

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/user-roles/deactivate"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor]}).to_string(),
        )
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);

    // The row is still there, flagged inactive.
    let rows = custodia::models::user_role::Entity::find()
        .filter(custodia::models::user_role::Column::UserId.eq(user_id))
        .filter(custodia::models::user_role::Column::RoleId.eq(editor_id))
        .all(&app.db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_active);

    // And the role is no longer effective.
    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/users/{}/roles", user["id"].as_str().unwrap())),
            &token,
        )
        .await;
    let data = res.data();
    let names: Vec<&str> = data["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"editor"));
}

#[tokio::test]
async fn replace_swaps_the_whole_set_and_empty_clears_it() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let user_id = user["id"].as_str().unwrap();
    let editor = app.create_role(&token, "editor").await;
    let viewer = app.create_role(&token, "viewer").await;

    let res = app
        .client
        .put_with_auth(
            &app.url(&format!("/api/users/{}/roles", user_id)),
            &token,
            &json!({"role_ids": [editor, viewer]}).to_string(),
        )
        .await;
    assert_eq!(res.status, 200, "body: {}", res.body);
    let data = res.data();
    let names: Vec<&str> = data["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    // The registration-time "usuario" role was replaced away.
    assert_eq!(names.len(), 2);
    assert!(!names.contains(&"usuario"));

    let res = app
        .client
        .put_with_auth(
            &app.url(&format!("/api/users/{}/roles", user_id)),
            &token,
            &json!({"role_ids": []}).to_string(),
        )
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["roles"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn users_by_role_excludes_inactive_users() {
    let app = TestApp::new().await;
    let (token, _) = app.register_user("Admin", "admin@example.com", "secret1").await;
    let (_, ana) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let (_, luis) = app.register_user("Luis", "luis@example.com", "secret1").await;
    let editor = app.create_role(&token, "editor").await;

    for user in [&ana, &luis] {
        app.client
            .post_with_auth(
                &app.url("/api/user-roles/assign"),
                &token,
                &json!({"user_id": user["id"], "role_ids": [editor]}).to_string(),
            )
            .await;
    }

    app.client
        .delete_with_auth(
            &app.url(&format!("/api/users/{}", luis["id"].as_str().unwrap())),
            &token,
        )
        .await;

    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/roles/{}/users", editor)), &token)
        .await;
    assert_eq!(res.status, 200);
    let data = res.data();
    let emails: Vec<&str> = data["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["ana@example.com"]);
}

#[tokio::test]
async fn deactivating_the_role_makes_assignments_ineffective() {
    let app = TestApp::new().await;
    let (token, user) = app.register_user("Ana", "ana@example.com", "secret1").await;
    let editor = app.create_role(&token, "editor").await;

    app.client
        .post_with_auth(
            &app.url("/api/user-roles/assign"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor]}).to_string(),
        )
        .await;

    // Soft-revoke the assignment first so the guard allows deactivation.
    app.client
        .post_with_auth(
            &app.url("/api/user-roles/deactivate"),
            &token,
            &json!({"user_id": user["id"], "role_ids": [editor]}).to_string(),
        )
        .await;
    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/roles/{}", editor)), &token)
        .await;
    assert_eq!(res.status, 204);

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/users/{}/roles", user["id"].as_str().unwrap())),
            &token,
        )
        .await;
    let data = res.data();
    let names: Vec<&str> = data["roles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"editor"));
}
