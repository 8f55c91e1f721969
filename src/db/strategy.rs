//! Connection strategies and provider resolution.
//!
//! Two different subsystems open an Access file:
//! - row queries and statements go through a single ODBC driver
//!   ([`FixedDriverStrategy`])
//! - catalog introspection goes through ADOX automation, trying several OLE DB
//!   providers in order ([`crate::db::catalog::CatalogProviderFallbackStrategy`])
//!
//! Both implement [`ConnectionStrategy`]; [`OperationKind`] picks which one an
//! operation uses.

use crate::db::odbc;
use crate::error::{DbError, DbResult};
use odbc_api::{Connection, ConnectionOptions};
use std::fmt;
use tracing::debug;

/// What an operation does with the database, which decides how it connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read statement returning rows
    RowQuery,
    /// Mutating statement returning an affected-row count
    Statement,
    /// Table, column and index metadata
    Catalog,
}

impl OperationKind {
    /// Catalog operations bind through provider fallback; everything else uses the fixed driver.
    pub fn uses_catalog(self) -> bool {
        matches!(self, Self::Catalog)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowQuery => write!(f, "row_query"),
            Self::Statement => write!(f, "statement"),
            Self::Catalog => write!(f, "catalog"),
        }
    }
}

/// A way of opening a short-lived session on one database file.
///
/// The returned session is owned by the calling operation and released when it
/// is dropped, on every exit path.
pub trait ConnectionStrategy {
    type Session;

    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Open a session on the file at `path`.
    fn open(&self, path: &str) -> DbResult<Self::Session>;

    /// Whether this strategy can connect at all on the current host.
    fn is_supported(&self) -> bool {
        true
    }
}

/// ODBC connection string for the fixed-driver strategy.
pub fn driver_connection_string(driver: &str, path: &str) -> String {
    format!("Driver={{{}}};DBQ={};", driver, path)
}

/// OLE DB connection string for binding an ADOX catalog.
pub fn provider_connection_string(provider: &str, path: &str) -> String {
    format!("Provider={};Data Source={};", provider, path)
}

/// First provider that accepted a connection, with the live handle.
#[derive(Debug)]
pub struct Resolved<T> {
    pub provider: String,
    pub handle: T,
}

/// Try each candidate in order and return the first that connects.
///
/// Individual failures are only logged at debug level; when every candidate
/// fails the caller gets one generic connection error.
pub fn resolve_first<T, I, F>(path: &str, candidates: I, mut attempt: F) -> DbResult<Resolved<T>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    F: FnMut(&str) -> DbResult<T>,
{
    let mut tried = 0usize;
    for candidate in candidates {
        let provider = candidate.as_ref();
        tried += 1;
        match attempt(provider) {
            Ok(handle) => {
                debug!(db_path = %path, provider = %provider, "Provider accepted connection");
                return Ok(Resolved {
                    provider: provider.to_string(),
                    handle,
                });
            }
            Err(e) => {
                debug!(db_path = %path, provider = %provider, error = %e, "Provider rejected connection");
            }
        }
    }

    Err(DbError::connection(
        format!(
            "No provider available for '{}' ({} tried): connection parameters restricted or driver missing",
            path, tried
        ),
        "Check that the file exists and is not locked, and that the Microsoft Access Database Engine is installed",
    ))
}

/// Opens an ODBC connection through one fixed driver name.
#[derive(Debug, Clone)]
pub struct FixedDriverStrategy {
    driver: String,
}

impl FixedDriverStrategy {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
        }
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn connection_string(&self, path: &str) -> String {
        driver_connection_string(&self.driver, path)
    }
}

impl ConnectionStrategy for FixedDriverStrategy {
    type Session = Connection<'static>;

    fn name(&self) -> &'static str {
        "fixed_driver"
    }

    fn open(&self, path: &str) -> DbResult<Self::Session> {
        let env = odbc::environment()?;
        env.connect_with_connection_string(
            &self.connection_string(path),
            ConnectionOptions::default(),
        )
        .map_err(|e| {
            DbError::connection(
                format!("Failed to open '{}' with driver '{}': {}", path, self.driver, e),
                "Check the file path and that the Access ODBC driver is installed (32/64-bit must match this process)",
            )
        })
    }
}
