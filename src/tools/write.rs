//! Write operation tool.
//!
//! This module implements the `execute` MCP tool for INSERT, UPDATE, DELETE
//! and DDL statements.

use crate::db::Database;
use crate::error::DbResult;
use crate::tools::format::render_rows_affected;
use crate::tools::{require_non_empty, run_blocking};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the execute tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteArgs {
    /// Path to the .mdb/.accdb file
    pub db_path: String,
    /// SQL statement to execute (INSERT, UPDATE, DELETE, or DDL like CREATE/DROP/ALTER)
    pub sql: String,
}

pub struct WriteToolHandler {
    database: Arc<dyn Database>,
}

impl WriteToolHandler {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    pub async fn execute(&self, args: ExecuteArgs) -> DbResult<String> {
        require_non_empty("dbPath", &args.db_path)?;
        require_non_empty("sql", &args.sql)?;

        let database = Arc::clone(&self.database);
        let (path, sql) = (args.db_path.clone(), args.sql);
        let result = run_blocking(move || database.execute(&path, &sql)).await?;

        info!(
            db_path = %args.db_path,
            rows_affected = result.rows_affected,
            execution_time_ms = result.execution_time_ms,
            "Write operation executed"
        );

        Ok(render_rows_affected(result.rows_affected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_args() {
        let json = r#"{
            "dbPath": "db.accdb",
            "sql": "UPDATE Orders SET Shipped = True WHERE ID = 7"
        }"#;

        let args: ExecuteArgs = serde_json::from_str(json).unwrap();
        assert_eq!(args.db_path, "db.accdb");
        assert!(args.sql.starts_with("UPDATE"));
    }

    #[test]
    fn test_execute_args_missing_path() {
        let json = r#"{"sql": "DELETE FROM Orders"}"#;
        assert!(serde_json::from_str::<ExecuteArgs>(json).is_err());
    }
}
