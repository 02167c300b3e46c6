//! Row, result-set and outcome types produced by the query executor.

mod outcome;
mod result_set;
mod row;

pub use outcome::{ErrorDescriptor, ErrorKind, QueryResult, TxResult};
pub use result_set::ResultSet;
pub use row::Row;
