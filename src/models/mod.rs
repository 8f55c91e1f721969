//! Data models for the Access MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

// Re-export commonly used types
pub use query::{ExecuteResult, QueryResult, ResultRow, ScalarValue, build_row};
pub use schema::{CatalogEntry, CatalogIndex, TableKind, TableSchema, user_table_names};
