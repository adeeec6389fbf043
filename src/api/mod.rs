use crate::api::handlers::{
    auth::{self, AuthState},
    config::{self as lab_config, LabConfig},
    health, root, sql,
    storage::{CredentialStore, PgCredentialStore},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Json, Router,
};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, request_id::PropagateRequestIdLayer, services::ServeDir,
    set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod error;
pub mod handlers;
mod openapi;

pub use openapi::openapi;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Settings for the HTTP server.
#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub dsn: SecretString,
    pub static_dir: Option<PathBuf>,
}

/// Build the API router over the given state.
///
/// No transport layers are attached, so tests can drive it directly.
#[must_use]
pub fn router(
    config: Arc<LabConfig>,
    auth_state: Arc<AuthState>,
    store: Arc<dyn CredentialStore>,
) -> Router {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .route(
            "/api/config",
            get(lab_config::get_config).post(lab_config::set_config),
        )
        .route("/api/sql", get(sql::sql))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api-docs/openapi.json", get(|| async { Json(openapi()) }))
        .layer(Extension(config))
        .layer(Extension(auth_state))
        .layer(Extension(store))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(server: ServerConfig) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(server.dsn.expose_secret())
        .await
        .context("Failed to connect to database")?;

    let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool));

    let mut app = router(
        Arc::new(LabConfig::new()),
        Arc::new(AuthState::new()),
        store,
    );

    if let Some(dir) = &server.static_dir {
        info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    let app = app.layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static(REQUEST_ID_HEADER),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                REQUEST_ID_HEADER,
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(CorsLayer::permissive()),
    );

    let listener = TcpListener::bind(format!("::0:{}", server.port)).await?;

    info!("Listening on [::]:{}", server.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {err}");
        }
        info!("Gracefully shutdown");
    })
    .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
