//! Normalization of driver errors into [`ErrorDescriptor`].

use tiberius::error::Error as DriverError;

use crate::results::{ErrorDescriptor, ErrorKind};

impl ErrorDescriptor {
    /// Describe a single driver error.
    #[must_use]
    pub fn from_driver_error(err: &DriverError) -> Self {
        match err {
            DriverError::Server(token) => Self {
                kind: ErrorKind::Server,
                message: token.message().to_string(),
                code: Some(token.code()),
                state: Some(token.state()),
                class: Some(token.class()),
                line_number: Some(token.line()),
                server_name: non_empty(token.server()),
                procedure: non_empty(token.procedure()),
            },
            DriverError::Io { message, .. } => Self::new(ErrorKind::Io, message.clone()),
            DriverError::Protocol(message) => Self::new(ErrorKind::Protocol, message.to_string()),
            DriverError::Tls(message) => Self::new(ErrorKind::Tls, message.clone()),
            DriverError::Conversion(message) | DriverError::Encoding(message) => {
                Self::new(ErrorKind::Conversion, message.to_string())
            }
            DriverError::Routing { .. } => Self::new(ErrorKind::Routing, err.to_string()),
            #[allow(unreachable_patterns)]
            _ => Self::new(ErrorKind::Other, err.to_string()),
        }
    }

    /// Describe a list of driver errors by its first element.
    #[must_use]
    pub fn from_driver_errors(errs: &[DriverError]) -> Self {
        errs.first().map_or_else(
            || Self::new(ErrorKind::Other, "driver reported an empty error list"),
            Self::from_driver_error,
        )
    }
}

impl From<&DriverError> for ErrorDescriptor {
    fn from(err: &DriverError) -> Self {
        Self::from_driver_error(err)
    }
}

impl From<DriverError> for ErrorDescriptor {
    fn from(err: DriverError) -> Self {
        Self::from_driver_error(&err)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
