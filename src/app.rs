use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::Config;
use crate::controllers::{self, AppState};
use crate::migrations::Migrator;
use crate::openapi::ApiDoc;
use crate::response::ApiResponse;

/// The custodia application: config, database and router assembly.
pub struct App {
    pub config: Config,
    pub db: DatabaseConnection,
}

impl App {
    /// Create an application from environment configuration.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::from_env()?;
        Self::with_config(config).await
    }

    /// Create an application with a given config. Pending migrations run
    /// here so the schema is ready before any request is served.
    pub async fn with_config(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let db = crate::db::connect(&config).await?;

        tracing::info!("Running pending database migrations...");
        Migrator::up(&db, None).await?;
        tracing::info!("Migrations complete.");

        Ok(App { config, db })
    }

    /// Build the Axum router with all API routes, docs and middleware.
    pub fn router(&self) -> Router {
        let config = Arc::new(self.config.clone());
        let is_dev = self.config.is_dev();

        let state = AppState {
            db: self.db.clone(),
            config,
        };

        let openapi_spec = ApiDoc::openapi();
        let openapi_json = openapi_spec.clone();

        let mut router = Router::new()
            .route("/", get(welcome))
            .merge(controllers::api_router().with_state(state))
            .merge(Scalar::with_url("/api-docs", openapi_spec))
            .route(
                "/api-docs/openapi.json",
                get(move || {
                    let spec = openapi_json.clone();
                    async move { axum::Json(spec) }
                }),
            )
            .layer(CorsLayer::permissive());

        // Tracing and request-id middleware only in development.
        if is_dev {
            use tower_http::LatencyUnit;
            use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse};

            let x_request_id = axum::http::HeaderName::from_static("x-request-id");
            router = router
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                        .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                        .on_response(
                            DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                );
        }

        router
    }

    /// Bind and serve until ctrl-c or SIGTERM.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.server_addr();
        let router = self.router();

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("custodia listening on http://{}", addr);
        tracing::info!("API docs available at http://{}/api-docs", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn welcome() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(serde_json::json!({
        "service": "custodia",
        "docs": "/api-docs",
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
