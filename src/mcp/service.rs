//! MCP service implementation using rmcp.
//!
//! This module defines the AccessService struct with the four Access tools
//! exposed via the MCP protocol using the rmcp framework's macros.

use crate::db::Database;
use crate::error::DbResult;
use crate::tools::query::{QueryArgs, QueryToolHandler};
use crate::tools::schema::{GetTableSchemaArgs, ListTablesArgs, SchemaToolHandler};
use crate::tools::write::{ExecuteArgs, WriteToolHandler};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AccessService {
    /// Database backend shared by all tool calls
    database: Arc<dyn Database>,
    /// Log raw tool arguments and results
    debug: bool,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl AccessService {
    /// Create a new AccessService instance.
    ///
    /// # Arguments
    ///
    /// * `database` - Backend every tool call runs against
    /// * `debug` - Log raw arguments and result text of every call
    pub fn new(database: Arc<dyn Database>, debug: bool) -> Self {
        Self {
            database,
            debug,
            tool_router: Self::tool_router(),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    fn log_args(&self, tool: &str, args: &impl Serialize) {
        if self.debug {
            let raw = serde_json::to_string(args).unwrap_or_default();
            info!(target: "access_mcp_server::tools", tool, args = %raw, "Tool called");
        }
    }

    fn respond(&self, tool: &str, outcome: DbResult<String>) -> Result<CallToolResult, McpError> {
        match outcome {
            Ok(text) => {
                if self.debug {
                    info!(target: "access_mcp_server::tools", tool, result = %text, "Tool result");
                }
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                warn!(tool, error = %e, "Tool call failed");
                Err(e.into())
            }
        }
    }
}

#[tool_router]
impl AccessService {
    #[tool(
        description = "Run a SQL query against an Access database file and return every row.\nOutput format: json (default), table, or markdown."
    )]
    pub async fn query(
        &self,
        Parameters(args): Parameters<QueryArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.log_args("query", &args);
        let handler = QueryToolHandler::new(self.database.clone());
        let outcome = handler.query(args).await;
        self.respond("query", outcome)
    }

    #[tool(
        description = "Execute a write statement (INSERT, UPDATE, DELETE or DDL) against an Access database file.\nReturns the number of affected rows."
    )]
    pub async fn execute(
        &self,
        Parameters(args): Parameters<ExecuteArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.log_args("execute", &args);
        let handler = WriteToolHandler::new(self.database.clone());
        let outcome = handler.execute(args).await;
        self.respond("execute", outcome)
    }

    #[tool(
        description = "List the user tables of an Access database file.\nSystem tables, queries and linked tables are excluded."
    )]
    pub async fn list_tables(
        &self,
        Parameters(args): Parameters<ListTablesArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.log_args("list_tables", &args);
        let handler = SchemaToolHandler::new(self.database.clone());
        let outcome = handler.list_tables(args).await;
        self.respond("list_tables", outcome)
    }

    #[tool(
        description = "Get the fields and primary key of a table in an Access database file.\nThe table name must match the catalog exactly."
    )]
    pub async fn get_table_schema(
        &self,
        Parameters(args): Parameters<GetTableSchemaArgs>,
    ) -> Result<CallToolResult, McpError> {
        self.log_args("get_table_schema", &args);
        let handler = SchemaToolHandler::new(self.database.clone());
        let outcome = handler.get_table_schema(args).await;
        self.respond("get_table_schema", outcome)
    }
}

#[tool_handler]
impl ServerHandler for AccessService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "access-mcp-server".to_owned(),
                title: Some("Access MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for Microsoft Access (.mdb/.accdb) database files.\n\
                \n\
                ## Workflow\n\
                1. Call `list_tables` with `dbPath` to see the user tables\n\
                2. Call `get_table_schema` with `dbPath` and `tableName` for fields and primary key\n\
                3. Use `query` for reads and `execute` for writes\n\
                \n\
                ## Notes\n\
                - Every call opens the file, does its work and closes it again\n\
                - `query` returns all rows; add a `TOP n` clause for large tables\n\
                - Table names are matched exactly as stored in the catalog"
                    .to_string(),
            ),
        }
    }
}
