//! HTTP surface: login form, cookie session and the sales dashboard page.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{HeaderValue, header},
    middleware,
    response::Response,
    routing::{any, get},
    Router,
};
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;

use crate::error::SalesDashboardError;
use crate::mssql::MssqlOptions;

pub mod config;
pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod session;
pub mod template;

pub use config::ServerConfig;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<MssqlOptions>,
    pub assets_dir: Arc<PathBuf>,
    pub key: Key,
    pub cookie_secure: bool,
}

impl AppState {
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            db: Arc::new(config.mssql_options()),
            assets_dir: Arc::new(config.assets_dir.clone()),
            key: session::derive_key(&config.cookie_secret),
            cookie_secure: config.cookie_secure(),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/robots933456.txt", get(handlers::health_check))
        .route("/login", get(handlers::login_page).post(handlers::do_login))
        .route("/logout", any(handlers::logout))
        .route("/dashboard", get(handlers::dashboard))
        .route("/assets/:asset", get(handlers::asset))
        .with_state(state)
        .layer(middleware::map_response(security_headers))
        .layer(TraceLayer::new_for_http())
}

async fn security_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("sameorigin"));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static(
            "camera=(), display-capture=(), microphone=(), geolocation=(), usb=()",
        ),
    );
    response
}

/// Bind the listener and serve until the process is stopped.
///
/// # Errors
/// Returns `SalesDashboardError::Io` if the listener cannot be bound or the
/// server fails.
pub async fn serve(config: ServerConfig) -> Result<(), SalesDashboardError> {
    let addr = config.socket_addr();
    let environment = if config.cookie_secure() { "production" } else { "development" };
    tracing::info!(port = config.port, environment, "HTTP port");
    tracing::info!(server = %config.db_server, database = %config.db_name, "Database server");
    if config.cookie_secure() && config.cookie_secret == "dev" {
        tracing::warn!("session cookies are signed with the development secret");
    }

    let app = router(AppState::from_config(&config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("READY. Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
