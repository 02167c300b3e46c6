use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use super::dashboard::{
    DASHBOARD_BATCH, LOGIN_QUERY, authenticated_user, dashboard_params, dashboard_values,
    login_params,
};
use super::error::AppError;
use super::{AppState, session, template};
use crate::mssql::{self, Connection};
use crate::results::QueryResult;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// GET /
pub async fn home(jar: SignedCookieJar) -> Redirect {
    if session::current_user(&jar).is_some() {
        Redirect::to("/dashboard")
    } else {
        Redirect::to("/login")
    }
}

/// GET /robots933456.txt, probed by the hosting platform.
pub async fn health_check() -> &'static str {
    tracing::info!("Health check: OK.");
    "OK"
}

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    if session::current_user(&jar).is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    let page = template::load(&state.assets_dir, "login.html").await?;
    Ok(Html(template::render(&page, &[])).into_response())
}

/// POST /login
pub async fn do_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut conn = mssql::connect(&state.db).await?;
    let outcome = conn
        .query(LOGIN_QUERY, &login_params(&form.username, &form.password))
        .await;
    release(conn).await;

    match outcome {
        QueryResult::Failure(error) => {
            tracing::warn!(%error, "login query failed");
            Ok((StatusCode::FORBIDDEN, "Login failed.").into_response())
        }
        QueryResult::Success(results) => match authenticated_user(&results) {
            Some(user) => {
                tracing::info!(%user, "logged in");
                let jar = session::start(jar, &user, state.cookie_secure);
                Ok((jar, Redirect::to("/dashboard")).into_response())
            }
            None => {
                tracing::info!(username = %form.username, "login rejected");
                Ok(Redirect::to("/login").into_response())
            }
        },
    }
}

/// ANY /logout
pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    (session::end(jar), Redirect::to("/login"))
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let Some(user) = session::current_user(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let jar = session::start(jar, &user, state.cookie_secure);

    let mut conn = mssql::connect(&state.db).await?;
    let outcome = conn.query(DASHBOARD_BATCH, &dashboard_params(&user)).await;
    release(conn).await;

    let results = match outcome {
        QueryResult::Success(results) => results,
        QueryResult::Failure(error) => {
            tracing::warn!(%error, %user, "dashboard query failed");
            return Err(AppError::DashboardUnavailable);
        }
    };
    let Some(values) = dashboard_values(&results) else {
        tracing::warn!(%user, "no dashboard metrics for the current period");
        return Err(AppError::DashboardUnavailable);
    };

    let page = template::load(&state.assets_dir, "dashboard.html").await?;
    Ok((jar, Html(template::render(&page, &values))).into_response())
}

/// GET /assets/:asset
pub async fn asset(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    if name.starts_with('.') || name.contains(['/', '\\']) {
        return StatusCode::NOT_FOUND.into_response();
    }
    match tokio::fs::read(state.assets_dir.join(&name)).await {
        Ok(bytes) => {
            let mut response = bytes.into_response();
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type(&name)),
            );
            headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=3600"),
            );
            let sent_at = chrono::Utc::now().timestamp_millis().to_string();
            if let Ok(stamp) = HeaderValue::from_str(&sent_at) {
                headers.insert("x-timestamp", stamp);
            }
            headers.insert("x-sent", HeaderValue::from_static("true"));
            response
        }
        Err(e) => {
            tracing::debug!(asset = %name, error = %e, "asset not served");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn content_type(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

async fn release(conn: Connection) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "closing connection failed");
    }
}
