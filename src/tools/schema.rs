//! Schema introspection tools.
//!
//! This module implements the `list_tables` and `get_table_schema` MCP tools.
//! Both read the metadata catalog rather than running SQL.

use crate::db::Database;
use crate::error::DbResult;
use crate::tools::format::{render_schema, render_tables};
use crate::tools::{require_non_empty, run_blocking};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListTablesArgs {
    /// Path to the .mdb/.accdb file
    pub db_path: String,
}

/// Input for the get_table_schema tool.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetTableSchemaArgs {
    /// Path to the .mdb/.accdb file
    pub db_path: String,
    /// Table name, matched exactly as stored in the catalog
    pub table_name: String,
}

/// Handler for schema introspection.
pub struct SchemaToolHandler {
    database: Arc<dyn Database>,
}

impl SchemaToolHandler {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    /// List user tables (system tables, views and links are excluded).
    pub async fn list_tables(&self, args: ListTablesArgs) -> DbResult<String> {
        require_non_empty("dbPath", &args.db_path)?;

        let database = Arc::clone(&self.database);
        let path = args.db_path.clone();
        let tables = run_blocking(move || database.list_tables(&path)).await?;

        info!(db_path = %args.db_path, table_count = tables.len(), "Tables listed");

        Ok(render_tables(&tables))
    }

    /// Describe one table's fields and primary key.
    pub async fn get_table_schema(&self, args: GetTableSchemaArgs) -> DbResult<String> {
        require_non_empty("dbPath", &args.db_path)?;
        require_non_empty("tableName", &args.table_name)?;

        let database = Arc::clone(&self.database);
        let (path, table) = (args.db_path.clone(), args.table_name.clone());
        let schema = run_blocking(move || database.table_schema(&path, &table)).await?;

        info!(
            db_path = %args.db_path,
            table = %args.table_name,
            field_count = schema.fields.len(),
            has_primary_key = schema.has_primary_key(),
            "Table schema read"
        );

        render_schema(&args.table_name, &schema)
    }
}
