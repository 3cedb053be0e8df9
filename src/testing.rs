use axum::http::HeaderMap;
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::Config;

/// A test application builder for integration testing.
///
/// Spins up a custodia server backed by an in-memory SQLite database.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn register_works() {
///     let app = TestApp::new().await;
///     let res = app
///         .post("/api/auth/register", r#"{"name":"Ana","email":"a@b.com","password":"secret1"}"#)
///         .await;
///     assert_eq!(res.status, 201);
/// }
/// ```
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: TestClient,
    pub db: DatabaseConnection,
    pub config: Config,
}

impl TestApp {
    /// Create a test app with open login (no admin gate).
    pub async fn new() -> Self {
        Self::with_config(Self::test_config(false)).await
    }

    /// Create a test app where login requires the admin role.
    pub async fn new_admin_gated() -> Self {
        Self::with_config(Self::test_config(true)).await
    }

    fn test_config(require_admin_role: bool) -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-for-testing".to_string(),
            jwt_expiry_hours: 24,
            server_host: "127.0.0.1".to_string(),
            server_port: 0, // OS assigns a random port
            environment: "test".to_string(),
            require_admin_role,
        }
    }

    /// Create a test app with a custom config.
    pub async fn with_config(config: Config) -> Self {
        let app = crate::App::with_config(config.clone())
            .await
            .expect("Failed to create test app");

        let router = app.router();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = TestClient::new(addr);

        TestApp {
            addr,
            client,
            db: app.db,
            config: app.config,
        }
    }

    /// Full URL for a path on the test server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Shorthand POST against the test server.
    pub async fn post(&self, path: &str, body: &str) -> TestResponse {
        self.client.post(&self.url(path), body).await
    }

    /// Register a user and return the auth token plus the user payload.
    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> (String, serde_json::Value) {
        let body = serde_json::json!({
            "name": name,
            "email": email,
            "password": password,
        });

        let res = self.post("/api/auth/register", &body.to_string()).await;
        assert_eq!(
            res.status, 201,
            "Registration failed with status {}: {}",
            res.status, res.body
        );

        let json = res.json();
        let token = json["data"]["token"].as_str().unwrap().to_string();
        let user = json["data"]["user"].clone();
        (token, user)
    }

    /// Login and return the auth token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let res = self.post("/api/auth/login", &body.to_string()).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.body);

        res.json()["data"]["token"].as_str().unwrap().to_string()
    }

    /// Create a role through the API and return its id.
    pub async fn create_role(&self, token: &str, name: &str) -> String {
        let body = serde_json::json!({ "name": name });
        let res = self
            .client
            .post_with_auth(&self.url("/api/roles"), token, &body.to_string())
            .await;
        assert_eq!(res.status, 201, "Role creation failed: {}", res.body);
        res.json()["data"]["id"].as_str().unwrap().to_string()
    }

    /// Create a permission through the API and return its id.
    pub async fn create_permission(
        &self,
        token: &str,
        name: &str,
        resource: &str,
        action: &str,
    ) -> String {
        let body = serde_json::json!({
            "name": name,
            "resource": resource,
            "action": action,
        });
        let res = self
            .client
            .post_with_auth(&self.url("/api/permissions"), token, &body.to_string())
            .await;
        assert_eq!(res.status, 201, "Permission creation failed: {}", res.body);
        res.json()["data"]["id"].as_str().unwrap().to_string()
    }
}

/// A simple HTTP test client with helper methods.
#[derive(Clone)]
pub struct TestClient {
    inner: reqwest::Client,
    base_addr: SocketAddr,
}

impl TestClient {
    pub fn new(addr: SocketAddr) -> Self {
        TestClient {
            inner: reqwest::Client::new(),
            base_addr: addr,
        }
    }

    /// Send a GET request.
    pub async fn get(&self, url: &str) -> TestResponse {
        let res = self.inner.get(url).send().await.expect("GET request failed");
        TestResponse::from_response(res).await
    }

    /// Send a GET request with an auth token.
    pub async fn get_with_auth(&self, url: &str, token: &str) -> TestResponse {
        let res = self
            .inner
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("GET request failed");
        TestResponse::from_response(res).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, url: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    /// Send a POST request with auth token and JSON body.
    pub async fn post_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .post(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed");
        TestResponse::from_response(res).await
    }

    /// Send a PUT request with auth token and JSON body.
    pub async fn put_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .put(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .body(body.to_string())
            .send()
            .await
            .expect("PUT request failed");
        TestResponse::from_response(res).await
    }

    /// Send a PATCH request with auth token and JSON body.
    pub async fn patch_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        let res = self
            .inner
            .patch(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .body(body.to_string())
            .send()
            .await
            .expect("PATCH request failed");
        TestResponse::from_response(res).await
    }

    /// Send a DELETE request with auth token.
    pub async fn delete_with_auth(&self, url: &str, token: &str) -> TestResponse {
        let res = self
            .inner
            .delete(url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("DELETE request failed");
        TestResponse::from_response(res).await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.base_addr)
    }
}

/// A simplified HTTP response for test assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().await.unwrap_or_default();
        TestResponse {
            status,
            body,
            headers,
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Failed to parse response as JSON")
    }

    /// Check if the response envelope indicates success.
    pub fn is_success(&self) -> bool {
        self.json()["success"].as_bool().unwrap_or(false)
    }

    /// Get the data field from the response.
    pub fn data(&self) -> serde_json::Value {
        self.json()["data"].clone()
    }

    /// Get the error message from the response.
    pub fn error_message(&self) -> String {
        self.json()["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}
