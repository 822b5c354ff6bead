//! mm-relay - A thin REST relay and local mirror in front of Mattermost
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Auth, users, direct conversations, messages              │
//! │  - Bearer token → local user → bound remote client          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Login/logout lifecycle                                   │
//! │  - Remote → local sync reconciliation                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │         Data Layer           │ │       Remote Adapter        │
//! │  - In-memory store           │ │  - Mattermost v4 client     │
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `auth`: Session registry and bearer extraction
//! - `remote`: Remote chat server client
//! - `data`: Local store and models
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod remote;
pub mod service;

use std::sync::Arc;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Local mirror of remote state
    pub store: Arc<dyn data::Store>,

    /// Local user id → remote client bindings
    pub sessions: Arc<auth::SessionRegistry>,

    /// Remote → local sync
    pub reconciler: Arc<service::SyncReconciler>,

    /// Login/logout
    pub auth: Arc<service::AuthService>,
}

impl AppState {
    /// Initialize application state with an empty in-memory store
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        Self::with_store(config, Arc::new(data::MemoryStore::new()))
    }

    /// Initialize application state over an existing store
    pub fn with_store(
        config: config::AppConfig,
        store: Arc<dyn data::Store>,
    ) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let http_client = reqwest::Client::builder()
            .user_agent(config.upstream.user_agent.clone())
            .timeout(config.upstream.timeout())
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let sessions = Arc::new(auth::SessionRegistry::new(Arc::clone(&store)));
        let reconciler = Arc::new(service::SyncReconciler::new(
            Arc::clone(&store),
            config.sync.clone(),
        ));
        let auth = Arc::new(service::AuthService::new(
            Arc::clone(&store),
            Arc::clone(&sessions),
            http_client,
            config.upstream.clone(),
        ));

        tracing::info!(
            timeout_seconds = config.upstream.timeout_seconds,
            "Application state initialized successfully"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            sessions,
            reconciler,
            auth,
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit};
    use tower::ServiceBuilder;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::relay_api_router())
        .merge(api::metrics_router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if server.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(%error, origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn test_config() -> config::AppConfig {
        config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: Vec::new(),
            },
            upstream: config::UpstreamConfig {
                timeout_seconds: 5,
                user_agent: "mm-relay/test".to_string(),
                api_version: "v4".to_string(),
            },
            sync: config::SyncConfig {
                users_page_size: 200,
                posts_page_size: 60,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_before_parsing() {
        let app = build_router(AppState::new(test_config()).unwrap());

        let request = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(vec![b' '; MAX_BODY_BYTES + 1]))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(
            body["message"].as_str().unwrap().contains("length limit"),
            "unexpected message: {body}"
        );
    }

    #[tokio::test]
    async fn health_check_is_public() {
        let app = build_router(AppState::new(test_config()).unwrap());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
