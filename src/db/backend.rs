//! The database operations behind the four tools.
//!
//! [`Database`] is the seam the tool handlers call. All methods are blocking;
//! handlers run them on the blocking thread pool. [`AccessDatabase`] is the
//! production implementation: every call opens its own connection (or catalog
//! binding) and releases it before returning.

use crate::config::Settings;
use crate::db::catalog::{CatalogProviderFallbackStrategy, MetadataCatalog, OdbcCatalogStrategy};
use crate::db::odbc;
use crate::db::strategy::{ConnectionStrategy, FixedDriverStrategy, OperationKind};
use crate::error::{DbError, DbResult};
use crate::models::{ExecuteResult, QueryResult, TableSchema};
use odbc_api::Connection;
use std::time::Instant;
use tracing::debug;

/// Blocking database operations on one Access file per call.
pub trait Database: Send + Sync + 'static {
    /// Run a read statement and return every row.
    fn query(&self, path: &str, sql: &str) -> DbResult<QueryResult>;

    /// Run a mutating statement and return the affected row count.
    fn execute(&self, path: &str, sql: &str) -> DbResult<ExecuteResult>;

    /// Names of user tables in catalog order.
    fn list_tables(&self, path: &str) -> DbResult<Vec<String>>;

    /// Fields and primary key of one table.
    fn table_schema(&self, path: &str, table: &str) -> DbResult<TableSchema>;
}

/// Access database reached through ODBC (rows, statements) and ADOX (catalog).
pub struct AccessDatabase {
    driver: FixedDriverStrategy,
    catalog: MetadataCatalog,
}

/// The strategy an operation kind connects through.
pub enum Route<'a> {
    Driver(&'a FixedDriverStrategy),
    Catalog(&'a MetadataCatalog),
}

impl Route<'_> {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Driver(driver) => driver.name(),
            Self::Catalog(_) => "catalog",
        }
    }
}

impl AccessDatabase {
    pub fn new(driver: FixedDriverStrategy, catalog: MetadataCatalog) -> Self {
        Self { driver, catalog }
    }

    /// Build strategies from resolved settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let driver = FixedDriverStrategy::new(settings.odbc_driver.clone());
        let secondary = settings
            .catalog_fallback
            .then(|| OdbcCatalogStrategy::new(driver.clone()));
        let catalog = MetadataCatalog::new(
            CatalogProviderFallbackStrategy::new(settings.providers.clone()),
            secondary,
        );
        Self::new(driver, catalog)
    }

    /// Pick the strategy for an operation kind.
    pub fn route(&self, kind: OperationKind) -> Route<'_> {
        if kind.uses_catalog() {
            Route::Catalog(&self.catalog)
        } else {
            Route::Driver(&self.driver)
        }
    }

    /// Open a driver connection for a row query or statement.
    fn connect(&self, kind: OperationKind, path: &str) -> DbResult<Connection<'static>> {
        let route = self.route(kind);
        debug!(db_path = %path, operation = %kind, strategy = route.name(), "Opening connection");
        match route {
            Route::Driver(driver) => driver.open(path),
            Route::Catalog(_) => Err(DbError::internal(format!(
                "{} operations do not use a driver connection",
                kind
            ))),
        }
    }

    /// The metadata catalog, for catalog operations.
    fn catalog(&self, kind: OperationKind) -> DbResult<&MetadataCatalog> {
        match self.route(kind) {
            Route::Catalog(catalog) => Ok(catalog),
            Route::Driver(_) => Err(DbError::internal(format!(
                "{} operations do not use the metadata catalog",
                kind
            ))),
        }
    }
}

impl Database for AccessDatabase {
    fn query(&self, path: &str, sql: &str) -> DbResult<QueryResult> {
        let conn = self.connect(OperationKind::RowQuery, path)?;
        odbc::fetch_all(&conn, sql)
    }

    fn execute(&self, path: &str, sql: &str) -> DbResult<ExecuteResult> {
        let start = Instant::now();
        let conn = self.connect(OperationKind::Statement, path)?;
        let rows_affected = odbc::execute_statement(&conn, sql)?;
        Ok(ExecuteResult {
            rows_affected,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn list_tables(&self, path: &str) -> DbResult<Vec<String>> {
        self.catalog(OperationKind::Catalog)?.list_tables(path)
    }

    fn table_schema(&self, path: &str, table: &str) -> DbResult<TableSchema> {
        self.catalog(OperationKind::Catalog)?.table_schema(path, table)
    }
}
