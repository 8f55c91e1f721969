//! MCP tool implementations.
//!
//! This module contains all database tool handlers:
//! - `query`: Run a read statement and render the rows
//! - `execute`: Run a mutating statement
//! - `list_tables`: List user tables in a database file
//! - `get_table_schema`: Get the fields and primary key of a table
//! - `format`: Text rendering shared by the handlers

pub mod format;
pub mod query;
pub mod schema;
pub mod write;

pub use format::OutputFormat;
pub use query::{QueryArgs, QueryToolHandler};
pub use schema::{GetTableSchemaArgs, ListTablesArgs, SchemaToolHandler};
pub use write::{ExecuteArgs, WriteToolHandler};

use crate::error::{DbError, DbResult};

/// Reject an empty required argument before any database access.
pub(crate) fn require_non_empty(field: &str, value: &str) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::invalid_input(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

/// Run blocking driver work on its own blocking-pool thread.
pub(crate) async fn run_blocking<T, F>(work: F) -> DbResult<T>
where
    F: FnOnce() -> DbResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DbError::internal(format!("Database task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("dbPath", "C:\\data\\db.mdb").is_ok());
        assert!(matches!(
            require_non_empty("dbPath", ""),
            Err(DbError::InvalidInput { .. })
        ));
        assert!(require_non_empty("sql", "   ").is_err());
    }

    #[tokio::test]
    async fn test_run_blocking_propagates_error() {
        let err = run_blocking(|| -> DbResult<()> { Err(DbError::internal("boom")) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
