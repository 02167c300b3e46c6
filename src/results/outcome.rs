use std::fmt;

use serde::ser::{Serialize, Serializer};

use super::result_set::ResultSet;
use super::row::Row;

/// Broad origin of a normalized failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Error token sent by the server (syntax, constraint, deadlock, ...)
    Server,
    Io,
    Protocol,
    Tls,
    Conversion,
    Routing,
    /// Rejected before anything was sent to the server
    Parameter,
    Other,
}

/// Canonical description of a failed batch or transaction statement.
///
/// Only server errors carry `code`, `state`, `class`, `line_number`,
/// `server_name` and `procedure`; transport failures carry the message alone.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
    pub code: Option<u32>,
    pub state: Option<u8>,
    pub class: Option<u8>,
    pub line_number: Option<u32>,
    pub server_name: Option<String>,
    pub procedure: Option<String>,
}

impl ErrorDescriptor {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
            state: None,
            class: None,
            line_number: None,
            server_name: None,
            procedure: None,
        }
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.line_number) {
            (Some(code), Some(line)) => write!(f, "{} (error {code}, line {line})", self.message),
            (Some(code), None) => write!(f, "{} (error {code})", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ErrorDescriptor {}

/// Outcome of one batch: every result set, or the first error.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Success(Vec<ResultSet>),
    Failure(ErrorDescriptor),
}

impl QueryResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    #[must_use]
    pub fn results(&self) -> Option<&[ResultSet]> {
        match self {
            QueryResult::Success(sets) => Some(sets),
            QueryResult::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ErrorDescriptor> {
        match self {
            QueryResult::Success(_) => None,
            QueryResult::Failure(error) => Some(error),
        }
    }

    /// First row of the first result set, if the batch succeeded and returned any rows.
    #[must_use]
    pub fn first_row(&self) -> Option<&Row> {
        self.results()?.first()?.first()
    }

    /// Convert into a `Result` for callers that prefer `?`.
    ///
    /// # Errors
    ///
    /// Returns the descriptor of a failed batch.
    pub fn into_result(self) -> Result<Vec<ResultSet>, ErrorDescriptor> {
        match self {
            QueryResult::Success(sets) => Ok(sets),
            QueryResult::Failure(error) => Err(error),
        }
    }
}

#[derive(serde::Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<&'a [ResultSet]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ErrorDescriptor>,
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Envelope {
            success: self.is_success(),
            results: self.results(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

/// Outcome of a begin, commit or rollback.
#[derive(Debug, Clone, PartialEq)]
pub enum TxResult {
    Success,
    Failure(ErrorDescriptor),
}

impl TxResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, TxResult::Success)
    }

    #[must_use]
    pub fn error(&self) -> Option<&ErrorDescriptor> {
        match self {
            TxResult::Success => None,
            TxResult::Failure(error) => Some(error),
        }
    }

    /// # Errors
    ///
    /// Returns the descriptor of a failed transaction statement.
    pub fn into_result(self) -> Result<(), ErrorDescriptor> {
        match self {
            TxResult::Success => Ok(()),
            TxResult::Failure(error) => Err(error),
        }
    }
}

impl Serialize for TxResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Envelope {
            success: self.is_success(),
            results: None,
            error: self.error(),
        }
        .serialize(serializer)
    }
}
