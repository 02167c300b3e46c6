use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::SalesDashboardError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Dashboard(#[from] SalesDashboardError),
    #[error("Dashboard unavailable")]
    DashboardUnavailable,
}

/// Log the cause and answer with a generic message; server error text never
/// reaches the browser.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            AppError::Dashboard(err) => {
                tracing::error!(error = %err, "request failed");
                "An internal error occurred."
            }
            AppError::DashboardUnavailable => "There was a problem loading the dashboard.",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}
