//! Convenient imports for common functionality.

pub use crate::error::SalesDashboardError;
pub use crate::mssql::{Connection, MssqlOptions, connect};
pub use crate::results::{ErrorDescriptor, ErrorKind, QueryResult, ResultSet, Row, TxResult};
pub use crate::types::{IsolationLevel, Length, Param, SqlType, SqlValue};
