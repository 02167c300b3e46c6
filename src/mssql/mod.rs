// MSSQL module - the result-normalization layer over tiberius
//
// - config: connection options and the tiberius config they produce
// - client: opening a connection and the owned `Connection` handle
// - params: named-parameter prelude and positional binding
// - collector: folds driver events into exactly one `QueryResult`
// - query: drives a batch's row stream through the collector
// - errors: driver error -> `ErrorDescriptor`
// - transaction: begin / commit / rollback

pub mod client;
pub mod collector;
pub mod config;
pub mod errors;
pub mod params;
pub mod query;
pub mod transaction;

pub use client::{Connection, connect};
pub use collector::{BatchCollector, BatchEvent};
pub use config::{DEFAULT_PORT, MssqlClient, MssqlOptions};
pub use params::PreparedBatch;
pub use query::run_batch;
pub use transaction::{begin_transaction, commit_transaction, rollback_transaction};
