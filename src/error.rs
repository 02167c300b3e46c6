use thiserror::Error;

/// Errors that escape the crate as hard failures.
///
/// Database errors raised while a batch or transaction statement runs are not
/// reported here; they are normalized into
/// [`QueryResult::Failure`](crate::results::QueryResult) and
/// [`TxResult::Failure`](crate::results::TxResult) instead.
#[derive(Debug, Error)]
pub enum SalesDashboardError {
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}
