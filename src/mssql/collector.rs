//! Event-driven accumulation of a batch's rows into result sets.
//!
//! The executor turns everything the driver reports for one batch into a
//! sequence of [`BatchEvent`]s. [`BatchCollector`] folds them into exactly one
//! [`QueryResult`]: the first terminal event (`Error` or `Done`) resolves it
//! and every later event is ignored.

use crate::results::{ErrorDescriptor, QueryResult, ResultSet, Row};

/// What the driver reported while a batch was running.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// A row of the statement currently producing output.
    Row(Row),
    /// The current statement's row output ended.
    Boundary,
    /// The batch failed.
    Error(ErrorDescriptor),
    /// The batch completed.
    Done,
}

#[derive(Debug, Default)]
pub struct BatchCollector {
    result_sets: Vec<ResultSet>,
    current: Vec<Row>,
    resolved: Option<QueryResult>,
}

impl BatchCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: BatchEvent) {
        if self.resolved.is_some() {
            tracing::trace!(?event, "ignoring event after resolution");
            return;
        }

        match event {
            BatchEvent::Row(row) => self.current.push(row),
            BatchEvent::Boundary => self.flush(),
            BatchEvent::Error(error) => {
                self.current.clear();
                self.resolved = Some(QueryResult::Failure(error));
            }
            BatchEvent::Done => {
                self.flush();
                let sets = std::mem::take(&mut self.result_sets);
                self.resolved = Some(QueryResult::Success(sets));
            }
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Take the outcome. A collector that never saw a terminal event resolves
    /// as if `Done` had arrived.
    #[must_use]
    pub fn into_result(mut self) -> QueryResult {
        if self.resolved.is_none() {
            self.apply(BatchEvent::Done);
        }
        self.resolved.unwrap_or_else(|| QueryResult::Success(Vec::new()))
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let rows = std::mem::take(&mut self.current);
            self.result_sets.push(ResultSet::new(rows));
        }
    }
}
