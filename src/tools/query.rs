//! Query execution tool.
//!
//! This module implements the `query` MCP tool: run one read statement against
//! an Access file and return every row as text.

use crate::db::Database;
use crate::error::DbResult;
use crate::tools::format::{OutputFormat, render_rows};
use crate::tools::{require_non_empty, run_blocking};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryArgs {
    /// Path to the .mdb/.accdb file
    pub db_path: String,
    /// SQL statement to run. Every row is returned.
    pub sql: String,
    /// Output format: "json" (default) returns an array of row objects, "table" an ASCII table, "markdown" a markdown table
    #[serde(default)]
    pub format: OutputFormat,
}

/// Handler for query execution.
pub struct QueryToolHandler {
    database: Arc<dyn Database>,
}

impl QueryToolHandler {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    /// Handle the query tool call.
    pub async fn query(&self, args: QueryArgs) -> DbResult<String> {
        require_non_empty("dbPath", &args.db_path)?;
        require_non_empty("sql", &args.sql)?;

        let database = Arc::clone(&self.database);
        let (path, sql) = (args.db_path.clone(), args.sql);
        let result = run_blocking(move || database.query(&path, &sql)).await?;

        info!(
            db_path = %args.db_path,
            row_count = result.row_count(),
            execution_time_ms = result.execution_time_ms,
            "Query executed"
        );

        render_rows(&result, args.format)
    }
}
