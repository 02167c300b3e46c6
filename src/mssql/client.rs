use tiberius::{Client, Config as TiberiusConfig, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;

use super::config::{MssqlClient, MssqlOptions};
use super::query::run_batch;
use super::transaction::{begin_transaction, commit_transaction, rollback_transaction};
use crate::error::SalesDashboardError;
use crate::results::{QueryResult, TxResult};
use crate::types::{IsolationLevel, Param};

/// Open one connection to SQL Server.
///
/// A server-side redirect (Azure SQL gateway routing) is followed once;
/// otherwise any failure is returned immediately without retrying.
///
/// # Errors
/// Returns `SalesDashboardError::ConnectionError` if the TCP connection or the
/// login fails.
pub async fn connect(opts: &MssqlOptions) -> Result<Connection, SalesDashboardError> {
    let mut config = opts.tiberius_config();
    let tcp = open_tcp(&config, opts).await?;

    let client = match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => client,
        Err(tiberius::error::Error::Routing { host, port }) => {
            tracing::debug!(%host, port, "following server redirect");
            config.host(&host);
            config.port(port);
            let tcp = TcpStream::connect((host.as_str(), port))
                .await
                .map_err(|e| {
                    SalesDashboardError::ConnectionError(format!("TCP connection error: {e}"))
                })?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| {
                    SalesDashboardError::ConnectionError(format!(
                        "SQL Server connection error: {e}"
                    ))
                })?
        }
        Err(e) => {
            return Err(SalesDashboardError::ConnectionError(format!(
                "SQL Server connection error: {e}"
            )));
        }
    };

    tracing::debug!(server = %opts.server, database = %opts.database, "connection opened");
    Ok(Connection { client })
}

async fn open_tcp(
    config: &TiberiusConfig,
    opts: &MssqlOptions,
) -> Result<TcpStream, SalesDashboardError> {
    let tcp = if opts.instance_name.is_some() {
        TcpStream::connect_named(config).await.map_err(|e| {
            SalesDashboardError::ConnectionError(format!("SQL Browser lookup error: {e}"))
        })?
    } else {
        TcpStream::connect((opts.server.as_str(), opts.effective_port()))
            .await
            .map_err(|e| {
                SalesDashboardError::ConnectionError(format!("TCP connection error: {e}"))
            })?
    };
    tcp.set_nodelay(true).map_err(|e| {
        SalesDashboardError::ConnectionError(format!("TCP socket option error: {e}"))
    })?;
    Ok(tcp)
}

/// One live session to the database, owned by whoever opened it.
///
/// Requests on a connection run one at a time; `&mut self` on every
/// operation keeps them from overlapping. Call [`close`](Connection::close)
/// when done; dropping the connection also closes the socket, without the
/// orderly shutdown.
pub struct Connection {
    client: MssqlClient,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("client", &"<MssqlClient>")
            .finish()
    }
}

impl Connection {
    /// Run a batch; see [`run_batch`].
    pub async fn query(&mut self, sql: &str, params: &[Param]) -> QueryResult {
        run_batch(&mut self.client, sql, params).await
    }

    /// Start a transaction, setting `isolation` first when given.
    ///
    /// The transaction stays open on this connection until [`commit`] or
    /// [`rollback`]; failed statements inside it do not roll it back.
    ///
    /// [`commit`]: Connection::commit
    /// [`rollback`]: Connection::rollback
    pub async fn begin(&mut self, isolation: Option<IsolationLevel>) -> TxResult {
        begin_transaction(&mut self.client, isolation).await
    }

    /// Commit the open transaction. Without one the server's error comes back
    /// as [`TxResult::Failure`].
    pub async fn commit(&mut self) -> TxResult {
        commit_transaction(&mut self.client).await
    }

    /// Roll back the open transaction, reporting server errors as
    /// [`TxResult::Failure`].
    pub async fn rollback(&mut self) -> TxResult {
        rollback_transaction(&mut self.client).await
    }

    /// Direct access to the driver client.
    pub fn client_mut(&mut self) -> &mut MssqlClient {
        &mut self.client
    }

    /// Close the connection.
    ///
    /// # Errors
    /// Returns the driver error if the shutdown handshake fails.
    pub async fn close(self) -> Result<(), SalesDashboardError> {
        self.client.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn transport_failures_are_connection_errors() {
        let opts = MssqlOptions::new(
            "127.0.0.1".into(),
            "Sales".into(),
            "dashboard".into(),
            "pw".into(),
        )
        .with_port(Some(1));
        let err = connect(&opts).await.unwrap_err();
        assert!(
            matches!(err, SalesDashboardError::ConnectionError(ref msg) if msg.starts_with("TCP")),
            "got {err:?}"
        );
    }
}
