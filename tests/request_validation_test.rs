//! Integration tests for request validation and error mapping.
//!
//! Validation failures must be reported before any database access, and
//! connection failures must surface as a single generic connection error.

mod common;

use access_mcp_server::db::Database;
use access_mcp_server::error::{DbError, DbResult};
use access_mcp_server::mcp::AccessService;
use access_mcp_server::models::{ExecuteResult, QueryResult, TableSchema};
use access_mcp_server::tools::query::QueryToolHandler;
use access_mcp_server::tools::schema::SchemaToolHandler;
use access_mcp_server::tools::write::WriteToolHandler;
use access_mcp_server::tools::{ExecuteArgs, GetTableSchemaArgs, ListTablesArgs, QueryArgs};
use common::northwind;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::ErrorCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_test::{assert_err, assert_ok};

/// Counts calls; every call fails as if the file could not be opened.
#[derive(Default)]
struct CountingDatabase {
    calls: AtomicUsize,
}

impl CountingDatabase {
    fn fail(&self, path: &str) -> DbError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DbError::connection(format!("No provider available for '{}'", path), "")
    }
}

impl Database for CountingDatabase {
    fn query(&self, path: &str, _sql: &str) -> DbResult<QueryResult> {
        Err(self.fail(path))
    }

    fn execute(&self, path: &str, _sql: &str) -> DbResult<ExecuteResult> {
        Err(self.fail(path))
    }

    fn list_tables(&self, path: &str) -> DbResult<Vec<String>> {
        Err(self.fail(path))
    }

    fn table_schema(&self, path: &str, _table: &str) -> DbResult<TableSchema> {
        Err(self.fail(path))
    }
}

#[tokio::test]
async fn test_empty_arguments_never_reach_the_database() {
    let database = Arc::new(CountingDatabase::default());
    let query = QueryToolHandler::new(database.clone());
    let write = WriteToolHandler::new(database.clone());
    let schema = SchemaToolHandler::new(database.clone());

    let err = query
        .query(QueryArgs {
            db_path: "db.mdb".into(),
            sql: "".into(),
            format: Default::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));

    assert_err!(
        write
            .execute(ExecuteArgs {
                db_path: "".into(),
                sql: "DELETE FROM t".into(),
            })
            .await
    );
    assert_err!(
        schema
            .list_tables(ListTablesArgs {
                db_path: "  ".into(),
            })
            .await
    );
    assert_err!(
        schema
            .get_table_schema(GetTableSchemaArgs {
                db_path: "db.mdb".into(),
                table_name: "".into(),
            })
            .await
    );

    assert_eq!(database.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_argument_is_rejected_by_deserialization() {
    let missing_table = serde_json::json!({ "dbPath": "db.mdb" });
    assert!(serde_json::from_value::<GetTableSchemaArgs>(missing_table).is_err());

    let missing_sql = serde_json::json!({ "dbPath": "db.mdb" });
    assert!(serde_json::from_value::<ExecuteArgs>(missing_sql).is_err());
}

#[tokio::test]
async fn test_nonexistent_path_is_connection_error_for_every_tool() {
    let service = AccessService::new(Arc::new(northwind()), false);
    let path = "C:\\does\\not\\exist.mdb";

    let errors = vec![
        service
            .query(Parameters(QueryArgs {
                db_path: path.into(),
                sql: "SELECT * FROM Customers".into(),
                format: Default::default(),
            }))
            .await
            .unwrap_err(),
        service
            .execute(Parameters(ExecuteArgs {
                db_path: path.into(),
                sql: "DELETE FROM Customers".into(),
            }))
            .await
            .unwrap_err(),
        service
            .list_tables(Parameters(ListTablesArgs {
                db_path: path.into(),
            }))
            .await
            .unwrap_err(),
        service
            .get_table_schema(Parameters(GetTableSchemaArgs {
                db_path: path.into(),
                table_name: "Customers".into(),
            }))
            .await
            .unwrap_err(),
    ];

    for err in errors {
        assert_eq!(err.code.0, ErrorCode::INTERNAL_ERROR.0);
        assert!(err.message.contains("No provider available"), "{}", err.message);
    }
}

#[tokio::test]
async fn test_failed_call_does_not_affect_next_call() {
    let service = AccessService::new(Arc::new(northwind()), true);
    assert!(
        service
            .query(Parameters(QueryArgs {
                db_path: "northwind.mdb".into(),
                sql: "not sql".into(),
                format: Default::default(),
            }))
            .await
            .is_err()
    );
    assert_ok!(
        service
            .list_tables(Parameters(ListTablesArgs {
                db_path: "northwind.mdb".into(),
            }))
            .await
    );
}
