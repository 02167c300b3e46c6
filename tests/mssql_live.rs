//! Runs against a real SQL Server when `MSSQL_TEST_SERVER` is set, e.g.
//! `MSSQL_TEST_SERVER=localhost MSSQL_TEST_PASSWORD=... cargo test --test mssql_live`.

use std::env;

use sales_dashboard::prelude::*;

fn live_options() -> Option<MssqlOptions> {
    let server = env::var("MSSQL_TEST_SERVER").ok()?;
    let port = env::var("MSSQL_TEST_PORT").ok().and_then(|p| p.parse().ok());
    Some(
        MssqlOptions::new(
            server,
            env::var("MSSQL_TEST_DATABASE").unwrap_or_else(|_| "master".into()),
            env::var("MSSQL_TEST_USER").unwrap_or_else(|_| "sa".into()),
            env::var("MSSQL_TEST_PASSWORD").unwrap_or_default(),
        )
        .with_port(port),
    )
}

async fn open() -> Option<Connection> {
    let opts = live_options()?;
    Some(connect(&opts).await.expect("connect to test server"))
}

fn int(outcome: &QueryResult, column: &str) -> Option<i64> {
    outcome.first_row()?.get(column)?.as_int()
}

#[tokio::test]
async fn two_statements_with_a_named_parameter_yield_two_result_sets() {
    let Some(mut conn) = open().await else { return };
    let params = [Param::new("UserName", SqlType::nvarchar(), "alice")];
    let outcome = conn
        .query(
            "SELECT @UserName AS UserName;\nSELECT LEN(@UserName) AS NameLength;",
            &params,
        )
        .await;
    let sets = outcome.into_result().expect("batch succeeds");
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].len(), 1);
    assert_eq!(
        sets[0][0].get("UserName").and_then(SqlValue::as_text),
        Some("alice")
    );
    assert_eq!(
        sets[1][0].get("NameLength").and_then(SqlValue::as_int),
        Some(5)
    );
    conn.close().await.unwrap();
}

#[tokio::test]
async fn batch_without_rows_succeeds_empty() {
    let Some(mut conn) = open().await else { return };
    let outcome = conn.query("DECLARE @x int = 1; SELECT 1 AS One WHERE 1 = 0;", &[]).await;
    assert_eq!(outcome, QueryResult::Success(Vec::new()));
    conn.close().await.unwrap();
}

#[tokio::test]
async fn columns_keep_server_order() {
    let Some(mut conn) = open().await else { return };
    let outcome = conn.query("SELECT 1 AS Zeta, 2 AS Alpha;", &[]).await;
    let row = outcome.first_row().expect("one row");
    assert_eq!(row.column_names(), ["Zeta", "Alpha"]);
    conn.close().await.unwrap();
}

#[tokio::test]
async fn server_errors_are_returned_as_data_with_their_line() {
    let Some(mut conn) = open().await else { return };
    let params = [Param::new("Id", SqlType::Int, 1)];
    let outcome = conn
        .query(
            "SELECT @Id AS Id;\nSELECT * FROM dbo.NoSuchTable_5f1c;",
            &params,
        )
        .await;
    let error = outcome.error().expect("batch fails");
    assert_eq!(error.kind, ErrorKind::Server);
    assert_eq!(error.code, Some(208));
    assert_eq!(error.line_number, Some(2));
    assert!(error.server_name.is_some());

    // the connection stays usable after a failed batch
    let next = conn.query("SELECT 1 AS One;", &[]).await;
    assert_eq!(int(&next, "One"), Some(1));
    conn.close().await.unwrap();
}

#[tokio::test]
async fn typed_parameters_round_trip() {
    let Some(mut conn) = open().await else { return };
    let amount = rust_decimal::Decimal::new(123_456, 2);
    let params = [
        Param::new(
            "Amount",
            SqlType::Decimal {
                precision: 19,
                scale: 2,
            },
            amount,
        ),
        Param::new("Flag", SqlType::Bit, true),
        Param::new("Missing", SqlType::Int, SqlValue::Null),
        Param::new("Id", SqlType::UniqueIdentifier, "6f9619ff-8b86-d011-b42d-00c04fc964ff"),
    ];
    let outcome = conn
        .query(
            "SELECT @Amount AS Amount, @Flag AS Flag, @Missing AS Missing, @Id AS Id;",
            &params,
        )
        .await;
    let row = outcome.first_row().expect("one row");
    assert_eq!(row.get("Amount"), Some(&SqlValue::Decimal(amount)));
    assert_eq!(row.get("Flag"), Some(&SqlValue::Bool(true)));
    assert_eq!(row.get("Missing"), Some(&SqlValue::Null));
    assert_eq!(
        row.get("Id").and_then(SqlValue::as_text),
        Some("6F9619FF-8B86-D011-B42D-00C04FC964FF")
    );
    conn.close().await.unwrap();
}

#[tokio::test]
async fn failing_statement_inside_transaction_needs_explicit_rollback() {
    let Some(mut conn) = open().await else { return };

    assert_eq!(
        conn.begin(Some(IsolationLevel::Serializable)).await,
        TxResult::Success
    );

    let level = conn
        .query(
            "SELECT transaction_isolation_level AS Level FROM sys.dm_exec_sessions WHERE session_id = @@SPID;",
            &[],
        )
        .await;
    assert_eq!(int(&level, "Level"), Some(4));

    let failing = conn.query("SELECT 1/0 AS Boom;", &[]).await;
    assert_eq!(failing.error().and_then(|e| e.code), Some(8134));

    let depth = conn.query("SELECT @@TRANCOUNT AS Depth;", &[]).await;
    assert_eq!(int(&depth, "Depth"), Some(1));

    assert!(conn.rollback().await.is_success());
    let depth = conn.query("SELECT @@TRANCOUNT AS Depth;", &[]).await;
    assert_eq!(int(&depth, "Depth"), Some(0));

    // nothing left to commit
    let commit = conn.commit().await;
    assert_eq!(commit.error().map(|e| e.kind), Some(ErrorKind::Server));
    conn.close().await.unwrap();
}
