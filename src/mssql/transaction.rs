use super::config::MssqlClient;
use crate::results::{ErrorDescriptor, TxResult};
use crate::types::IsolationLevel;

/// Begin a transaction, optionally setting the isolation level first.
///
/// Without a level the session keeps whatever level it already has. The
/// statements are sent as a plain SQL batch so the level and the open
/// transaction persist on the session after the call.
pub async fn begin_transaction(
    client: &mut MssqlClient,
    isolation: Option<IsolationLevel>,
) -> TxResult {
    run_control(client, &begin_sql(isolation)).await
}

/// Commit the open transaction.
pub async fn commit_transaction(client: &mut MssqlClient) -> TxResult {
    run_control(client, "COMMIT TRANSACTION;").await
}

/// Roll back the open transaction.
pub async fn rollback_transaction(client: &mut MssqlClient) -> TxResult {
    run_control(client, "ROLLBACK TRANSACTION;").await
}

pub(crate) fn begin_sql(isolation: Option<IsolationLevel>) -> String {
    match isolation {
        Some(level) => format!(
            "SET TRANSACTION ISOLATION LEVEL {}; BEGIN TRANSACTION;",
            level.as_sql()
        ),
        None => "BEGIN TRANSACTION;".to_string(),
    }
}

async fn run_control(client: &mut MssqlClient, sql: &str) -> TxResult {
    tracing::debug!(sql, "transaction control");
    let outcome = match client.simple_query(sql).await {
        Ok(stream) => stream.into_results().await.map(|_| ()),
        Err(e) => Err(e),
    };
    match outcome {
        Ok(()) => TxResult::Success,
        Err(e) => {
            let error = ErrorDescriptor::from_driver_error(&e);
            tracing::warn!(%error, sql, "transaction control failed");
            TxResult::Failure(error)
        }
    }
}
