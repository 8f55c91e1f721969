//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection strategies and provider resolution
//! - ODBC row queries, statements and catalog functions
//! - Metadata catalog adapter (ADOX with ODBC fallback)
//! - The `Database` seam used by the tool handlers

#[cfg(windows)]
pub mod adox;
pub mod backend;
pub mod catalog;
pub mod odbc;
pub mod strategy;

pub use backend::{AccessDatabase, Database, Route};
pub use catalog::{
    BoundCatalog, CatalogProviderFallbackStrategy, MetadataCatalog, OdbcCatalogStrategy,
};
pub use strategy::{ConnectionStrategy, FixedDriverStrategy, OperationKind, resolve_first};
