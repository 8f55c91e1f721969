//! Metadata catalog adapter.
//!
//! Tables, columns and primary keys are read through a catalog API that is
//! separate from the row-query path. The primary strategy binds an ADOX
//! catalog, trying each configured OLE DB provider in order. When that fails
//! (no provider binds, automation unavailable, non-Windows host) the adapter
//! can retry through ODBC catalog functions over the fixed driver.
//!
//! Lookups that fail *after* a successful bind are reported as-is and never
//! retried on the secondary strategy.

use crate::db::odbc::OdbcCatalog;
use crate::db::strategy::{ConnectionStrategy, FixedDriverStrategy};
use crate::error::{DbError, DbResult};
use crate::models::{CatalogEntry, TableSchema, user_table_names};
use tracing::{debug, warn};

/// A catalog bound to one database file for the duration of one call.
pub trait BoundCatalog {
    /// Every entry of the table collection, in catalog order.
    fn entries(&mut self) -> DbResult<Vec<CatalogEntry>>;

    /// Columns and primary key of `table`, looked up by exact name.
    fn table_schema(&mut self, table: &str) -> DbResult<TableSchema>;
}

impl BoundCatalog for std::convert::Infallible {
    fn entries(&mut self) -> DbResult<Vec<CatalogEntry>> {
        match *self {}
    }

    fn table_schema(&mut self, _table: &str) -> DbResult<TableSchema> {
        match *self {}
    }
}

/// Binds an `ADOX.Catalog` by trying OLE DB providers in preference order.
#[derive(Debug, Clone)]
pub struct CatalogProviderFallbackStrategy {
    providers: Vec<String>,
}

impl CatalogProviderFallbackStrategy {
    pub fn new(providers: Vec<String>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[String] {
        &self.providers
    }
}

#[cfg(windows)]
impl ConnectionStrategy for CatalogProviderFallbackStrategy {
    type Session = crate::db::adox::AdoxCatalog;

    fn name(&self) -> &'static str {
        "adox_provider_fallback"
    }

    fn open(&self, path: &str) -> DbResult<Self::Session> {
        crate::db::adox::AdoxCatalog::bind(path, &self.providers)
    }
}

#[cfg(not(windows))]
impl ConnectionStrategy for CatalogProviderFallbackStrategy {
    type Session = std::convert::Infallible;

    fn name(&self) -> &'static str {
        "adox_provider_fallback"
    }

    fn open(&self, path: &str) -> DbResult<Self::Session> {
        Err(DbError::connection(
            format!(
                "Cannot open catalog for '{}': ADOX automation is only available on Windows",
                path
            ),
            "Enable catalogFallback to use ODBC catalog functions instead",
        ))
    }

    fn is_supported(&self) -> bool {
        false
    }
}

/// Reads the catalog through ODBC catalog functions on a fixed-driver connection.
#[derive(Debug, Clone)]
pub struct OdbcCatalogStrategy {
    driver: FixedDriverStrategy,
}

impl OdbcCatalogStrategy {
    pub fn new(driver: FixedDriverStrategy) -> Self {
        Self { driver }
    }
}

impl ConnectionStrategy for OdbcCatalogStrategy {
    type Session = OdbcCatalog;

    fn name(&self) -> &'static str {
        "odbc_catalog"
    }

    fn open(&self, path: &str) -> DbResult<Self::Session> {
        self.driver.open(path).map(OdbcCatalog::new)
    }
}

/// Lists tables and describes table schemas.
pub struct MetadataCatalog<P = CatalogProviderFallbackStrategy, S = OdbcCatalogStrategy> {
    primary: P,
    secondary: Option<S>,
}

impl<P, S> MetadataCatalog<P, S>
where
    P: ConnectionStrategy,
    P::Session: BoundCatalog,
    S: ConnectionStrategy,
    S::Session: BoundCatalog,
{
    pub fn new(primary: P, secondary: Option<S>) -> Self {
        Self { primary, secondary }
    }

    /// Names of user tables (catalog type exactly `TABLE`), in catalog order.
    pub fn list_tables(&self, path: &str) -> DbResult<Vec<String>> {
        let entries = self.with_catalog(path, |catalog| catalog.entries())?;
        Ok(user_table_names(entries))
    }

    /// Fields and primary key of one table.
    pub fn table_schema(&self, path: &str, table: &str) -> DbResult<TableSchema> {
        self.with_catalog(path, |catalog| catalog.table_schema(table))
    }

    /// Bind a catalog for this call, run `op`, and release the binding.
    fn with_catalog<R>(
        &self,
        path: &str,
        op: impl Fn(&mut dyn BoundCatalog) -> DbResult<R>,
    ) -> DbResult<R> {
        let primary_err = match self.primary.open(path) {
            Ok(mut session) => {
                debug!(db_path = %path, strategy = self.primary.name(), "Catalog bound");
                return op(&mut session);
            }
            Err(e) => e,
        };

        let Some(secondary) = &self.secondary else {
            return Err(primary_err);
        };

        if self.primary.is_supported() {
            warn!(
                db_path = %path,
                strategy = self.primary.name(),
                fallback = secondary.name(),
                error = %primary_err,
                "Primary catalog strategy failed, trying fallback"
            );
        } else {
            debug!(
                db_path = %path,
                strategy = self.primary.name(),
                fallback = secondary.name(),
                "Primary catalog strategy unsupported on this host, using fallback"
            );
        }

        match secondary.open(path) {
            Ok(mut session) => {
                debug!(db_path = %path, strategy = secondary.name(), "Catalog bound");
                op(&mut session)
            }
            Err(secondary_err) => Err(DbError::connection(
                format!(
                    "Cannot connect to '{}' via catalog: {}; fallback: {}",
                    path, primary_err, secondary_err
                ),
                "Check the file path, file locks and installed Access database engine",
            )),
        }
    }
}
