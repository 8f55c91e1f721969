//! Access MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to query and inspect Microsoft Access (.mdb/.accdb) database files.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::{Config, Settings};
pub use error::DbError;
pub use mcp::AccessService;
