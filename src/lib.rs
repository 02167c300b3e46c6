//! Sales dashboard over a thin async SQL Server result-normalization layer.
//!
//! [`mssql`] opens connections and runs batches and transaction statements,
//! reporting every database error as data ([`QueryResult`], [`TxResult`]).
//! [`web`] is the session-authenticated dashboard built on top of it.

pub mod error;
pub mod mssql;
pub mod prelude;
pub mod results;
pub mod types;
pub mod web;

pub use error::SalesDashboardError;
pub use mssql::{Connection, MssqlOptions, connect};
pub use results::{ErrorDescriptor, ErrorKind, QueryResult, ResultSet, Row, TxResult};
pub use types::{IsolationLevel, Length, Param, SqlType, SqlValue};
