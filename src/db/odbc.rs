//! ODBC access: row queries, statements and catalog functions.
//!
//! Every call works on a connection opened by the caller and dropped right
//! after; nothing here keeps state between calls except the process-wide ODBC
//! environment handle.
//!
//! Driver I/O is kept thin. Turning fetched cells and catalog rows into model
//! values happens in plain functions over owned data ([`to_scalar`],
//! [`catalog_entries`], [`table_fields`], [`statistics_indexes`]).

use crate::db::catalog::BoundCatalog;
use crate::error::{DbError, DbResult};
use crate::models::{
    CatalogEntry, CatalogIndex, QueryResult, ResultRow, ScalarValue, TableSchema, build_row,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use odbc_api::handles::{SqlResult, Statement, StatementImpl};
use odbc_api::sys::{HStmt, SmallInt, SqlReturn, USmallInt, WChar};
use odbc_api::{
    Bit, Connection, Cursor, CursorImpl, CursorRow, DataType, Environment, Nullable,
    ResultSetMetadata,
};
use std::ptr;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::debug;

static ENVIRONMENT: OnceLock<Environment> = OnceLock::new();

/// The process-wide ODBC environment, created on first use.
pub fn environment() -> DbResult<&'static Environment> {
    if let Some(env) = ENVIRONMENT.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        DbError::connection(
            format!("Failed to initialize ODBC environment: {}", e),
            "Install an ODBC driver manager (unixODBC on Linux)",
        )
    })?;
    // another thread may have stored one first
    let _ = ENVIRONMENT.set(env);
    ENVIRONMENT
        .get()
        .ok_or_else(|| DbError::internal("ODBC environment was not stored"))
}

// =============================================================================
// Value decoding
// =============================================================================

/// How a column is read out of the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// BYTE, INTEGER and LONG columns
    Integer,
    /// BIGINT columns (ACE 16 "Large Number")
    BigInt,
    Float,
    Boolean,
    Binary,
    /// Text, and everything without a native scalar form (dates, currency, GUIDs)
    Text,
}

/// Classify an ODBC column type.
pub fn classify(data_type: &DataType) -> ValueKind {
    match data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Integer => ValueKind::Integer,
        DataType::BigInt => ValueKind::BigInt,
        DataType::Real | DataType::Double | DataType::Float { .. } => ValueKind::Float,
        DataType::Bit => ValueKind::Boolean,
        DataType::Binary { .. } | DataType::Varbinary { .. } | DataType::LongVarbinary { .. } => {
            ValueKind::Binary
        }
        _ => ValueKind::Text,
    }
}

/// Decode binary data as text.
///
/// Valid UTF-8 is returned as-is; anything else is base64 encoded.
pub fn decode_bytes(bytes: &[u8]) -> ScalarValue {
    match std::str::from_utf8(bytes) {
        Ok(s) => ScalarValue::String(s.to_string()),
        Err(_) => ScalarValue::String(STANDARD.encode(bytes)),
    }
}

/// One cell as the driver handed it over. `None` is SQL NULL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawCell<'a> {
    Integer(Option<i64>),
    Float(Option<f64>),
    /// `SQL_C_BIT` byte; any non-zero value is true
    Bit(Option<u8>),
    Bytes(Option<&'a [u8]>),
    /// UTF-16 text
    Wide(Option<&'a [u16]>),
}

/// Convert a fetched cell into a result value.
pub fn to_scalar(cell: RawCell<'_>) -> ScalarValue {
    match cell {
        RawCell::Integer(v) => v.into(),
        RawCell::Float(v) => v.into(),
        RawCell::Bit(v) => v.map(|b| b != 0).into(),
        RawCell::Bytes(Some(bytes)) => decode_bytes(bytes),
        RawCell::Wide(Some(text)) => ScalarValue::String(String::from_utf16_lossy(text)),
        RawCell::Bytes(None) | RawCell::Wide(None) => ScalarValue::Null,
    }
}

/// Reusable buffers for variable length columns.
#[derive(Default)]
struct Buffers {
    bytes: Vec<u8>,
    wide: Vec<u16>,
}

fn read_value(
    row: &mut CursorRow<'_>,
    col: u16,
    kind: ValueKind,
    buffers: &mut Buffers,
) -> DbResult<ScalarValue> {
    let cell = match kind {
        ValueKind::Integer => {
            let mut target = Nullable::<i32>::null();
            row.get_data(col, &mut target)?;
            RawCell::Integer(target.into_opt().map(i64::from))
        }
        ValueKind::BigInt => {
            let mut target = Nullable::<i64>::null();
            row.get_data(col, &mut target)?;
            RawCell::Integer(target.into_opt())
        }
        ValueKind::Float => {
            let mut target = Nullable::<f64>::null();
            row.get_data(col, &mut target)?;
            RawCell::Float(target.into_opt())
        }
        ValueKind::Boolean => {
            let mut target = Nullable::<Bit>::null();
            row.get_data(col, &mut target)?;
            RawCell::Bit(target.into_opt().map(|bit| bit.0))
        }
        ValueKind::Binary => {
            let present = row.get_binary(col, &mut buffers.bytes)?;
            RawCell::Bytes(present.then_some(buffers.bytes.as_slice()))
        }
        ValueKind::Text => {
            let present = row.get_wide_text(col, &mut buffers.wide)?;
            RawCell::Wide(present.then_some(buffers.wide.as_slice()))
        }
    };
    Ok(to_scalar(cell))
}

/// Read every remaining row of a cursor into memory.
///
/// A failure on any row aborts and discards the rows read so far.
fn materialize(mut cursor: impl Cursor) -> DbResult<(Vec<String>, Vec<ResultRow>)> {
    let num_cols = u16::try_from(cursor.num_result_cols()?).unwrap_or(0);
    let mut columns = Vec::with_capacity(num_cols as usize);
    let mut kinds = Vec::with_capacity(num_cols as usize);
    for col in 1..=num_cols {
        columns.push(cursor.col_name(col)?);
        kinds.push(classify(&cursor.col_data_type(col)?));
    }

    let mut buffers = Buffers::default();
    let mut rows = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        let mut values = Vec::with_capacity(columns.len());
        for (idx, (name, kind)) in columns.iter().zip(&kinds).enumerate() {
            let value = read_value(&mut row, idx as u16 + 1, *kind, &mut buffers)?;
            values.push((name.clone(), value));
        }
        rows.push(build_row(values));
    }
    Ok((columns, rows))
}

// =============================================================================
// Row query and statement execution
// =============================================================================

/// Run a read statement and materialize the full result set.
pub fn fetch_all(conn: &Connection<'_>, sql: &str) -> DbResult<QueryResult> {
    let start = Instant::now();
    debug!(sql = %sql, "Executing query");

    let (columns, rows) = match conn.execute(sql, ())? {
        Some(cursor) => materialize(cursor)?,
        None => (Vec::new(), Vec::new()),
    };

    Ok(QueryResult {
        columns,
        rows,
        execution_time_ms: start.elapsed().as_millis() as u64,
    })
}

/// Run a mutating statement and return the affected row count.
///
/// The count is best-effort: a driver that cannot report one yields zero.
pub fn execute_statement(conn: &Connection<'_>, sql: &str) -> DbResult<u64> {
    debug!(sql = %sql, "Executing statement");

    let mut statement = conn.preallocate()?;
    {
        // the cursor borrows the statement; release it before reading the count
        let _cursor = statement.execute(sql, ())?;
    }
    Ok(affected_rows(statement.row_count()))
}

/// Affected-row count as reported by `SQLRowCount`, zero when unavailable.
pub fn affected_rows(reported: Result<Option<usize>, odbc_api::Error>) -> u64 {
    match reported {
        Ok(count) => count.unwrap_or(0) as u64,
        Err(e) => {
            debug!(error = %e, "Driver did not report affected row count");
            0
        }
    }
}

// =============================================================================
// Catalog functions (secondary metadata strategy)
// =============================================================================

// SQLStatistics has no binding in odbc-api; declared against the same driver
// manager odbc-sys links.
#[allow(non_snake_case)]
#[cfg_attr(windows, link(name = "odbc32"))]
#[cfg_attr(not(windows), link(name = "odbc"))]
unsafe extern "system" {
    fn SQLStatisticsW(
        statement_handle: HStmt,
        catalog_name: *const WChar,
        name_length_1: SmallInt,
        schema_name: *const WChar,
        name_length_2: SmallInt,
        table_name: *const WChar,
        name_length_3: SmallInt,
        unique: USmallInt,
        reserved: USmallInt,
    ) -> SqlReturn;
}

const SQL_INDEX_ALL: USmallInt = 1;
const SQL_QUICK: USmallInt = 0;

/// `TYPE` value of the table-statistics row that precedes the index rows.
const SQL_TABLE_STAT: &str = "0";

/// Index name the Access engine gives a table's primary key.
pub const PRIMARY_KEY_INDEX: &str = "PrimaryKey";

fn to_sql_result(ret: SqlReturn, function: &'static str) -> SqlResult<()> {
    match ret {
        SqlReturn::SUCCESS => SqlResult::Success(()),
        SqlReturn::SUCCESS_WITH_INFO => SqlResult::SuccessWithInfo(()),
        _ => SqlResult::Error { function },
    }
}

/// Open an `SQLStatistics` result set listing every index of `table`.
fn statistics<'c>(
    conn: &'c Connection<'_>,
    table: &str,
) -> DbResult<CursorImpl<StatementImpl<'c>>> {
    let statement = conn.preallocate()?.into_statement();
    let name: Vec<WChar> = table.encode_utf16().collect();
    let name_len = SmallInt::try_from(name.len())
        .map_err(|_| DbError::invalid_input(format!("Table name is too long: {}", table)))?;

    // SAFETY: `statement` is a freshly allocated handle and `name` outlives the
    // call; its length is passed explicitly, so no terminator is read.
    let ret = unsafe {
        SQLStatisticsW(
            statement.as_sys(),
            ptr::null(),
            0,
            ptr::null(),
            0,
            name.as_ptr(),
            name_len,
            SQL_INDEX_ALL,
            SQL_QUICK,
        )
    };
    to_sql_result(ret, "SQLStatisticsW").into_result(&statement)?;

    // SAFETY: SQLStatistics succeeded, so the statement is in cursor state.
    Ok(unsafe { CursorImpl::new(statement) })
}

/// Read the given 1-based text columns from every row of a catalog cursor.
fn read_text_columns<const N: usize>(
    mut cursor: impl Cursor,
    cols: [u16; N],
) -> DbResult<Vec<[Option<String>; N]>> {
    let mut buffer = Vec::new();
    let mut out = Vec::new();
    while let Some(mut row) = cursor.next_row()? {
        let mut values = [const { None }; N];
        for (slot, col) in values.iter_mut().zip(cols) {
            if row.get_wide_text(col, &mut buffer)? {
                *slot = Some(String::from_utf16_lossy(&buffer));
            }
        }
        out.push(values);
    }
    Ok(out)
}

// SQLTables: TABLE_NAME is column 3, TABLE_TYPE column 4.
const TABLES_COLS: [u16; 2] = [3, 4];
// SQLColumns: TABLE_NAME, COLUMN_NAME.
const COLUMNS_COLS: [u16; 2] = [3, 4];
// SQLStatistics: TABLE_NAME, TYPE, INDEX_NAME, ORDINAL_POSITION, COLUMN_NAME.
const STATISTICS_COLS: [u16; 5] = [3, 7, 6, 8, 9];

/// `SQLTables` rows (`TABLE_NAME`, `TABLE_TYPE`) as catalog entries, in
/// driver order. Rows without a name are skipped.
pub fn catalog_entries(rows: Vec<[Option<String>; 2]>) -> Vec<CatalogEntry> {
    rows.into_iter()
        .filter_map(|[name, kind]| Some(CatalogEntry::new(name?, &kind.unwrap_or_default())))
        .collect()
}

/// Column names of `table` from `SQLColumns` rows (`TABLE_NAME`, `COLUMN_NAME`).
///
/// The table argument of `SQLColumns` is a search pattern, so `Order_Items`
/// also returns the columns of `OrderXItems`; only exact matches are kept.
pub fn table_fields(rows: Vec<[Option<String>; 2]>, table: &str) -> Vec<String> {
    rows.into_iter()
        .filter(|[name, _]| name.as_deref() == Some(table))
        .filter_map(|[_, column]| column)
        .collect()
}

/// Indexes of `table` from `SQLStatistics` rows (`TABLE_NAME`, `TYPE`,
/// `INDEX_NAME`, `ORDINAL_POSITION`, `COLUMN_NAME`).
///
/// Indexes keep the order they first appear in; columns within an index are
/// ordered by position. The index named [`PRIMARY_KEY_INDEX`] is the primary key.
pub fn statistics_indexes(rows: Vec<[Option<String>; 5]>, table: &str) -> Vec<CatalogIndex> {
    let mut indexes: Vec<(CatalogIndex, Vec<i64>)> = Vec::new();
    for [name, kind, index, position, column] in rows {
        if name.as_deref() != Some(table) || kind.as_deref() == Some(SQL_TABLE_STAT) {
            continue;
        }
        let (Some(index), Some(column)) = (index, column) else {
            continue;
        };
        let position = position
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(i64::MAX);

        let slot = match indexes.iter().position(|(idx, _)| idx.name == index) {
            Some(slot) => slot,
            None => {
                indexes.push((
                    CatalogIndex {
                        primary_key: index.eq_ignore_ascii_case(PRIMARY_KEY_INDEX),
                        name: index,
                        columns: Vec::new(),
                    },
                    Vec::new(),
                ));
                indexes.len() - 1
            }
        };
        let (idx, positions) = &mut indexes[slot];
        idx.columns.push(column);
        positions.push(position);
    }

    indexes
        .into_iter()
        .map(|(mut idx, positions)| {
            let mut keyed: Vec<(i64, String)> = positions.into_iter().zip(idx.columns).collect();
            // stable: equal positions keep driver order
            keyed.sort_by_key(|(position, _)| *position);
            idx.columns = keyed.into_iter().map(|(_, column)| column).collect();
            idx
        })
        .collect()
}

/// Catalog view over an ODBC connection, using `SQLTables`, `SQLColumns` and
/// `SQLStatistics` instead of ADOX automation.
pub struct OdbcCatalog {
    conn: Connection<'static>,
}

impl OdbcCatalog {
    pub fn new(conn: Connection<'static>) -> Self {
        Self { conn }
    }
}

impl BoundCatalog for OdbcCatalog {
    fn entries(&mut self) -> DbResult<Vec<CatalogEntry>> {
        let cursor = self.conn.tables("", "", "", "")?;
        Ok(catalog_entries(read_text_columns(cursor, TABLES_COLS)?))
    }

    fn table_schema(&mut self, table: &str) -> DbResult<TableSchema> {
        let cursor = self.conn.columns("", "", table, "")?;
        let fields = table_fields(read_text_columns(cursor, COLUMNS_COLS)?, table);
        if fields.is_empty() {
            return Err(DbError::schema("Table has no columns or does not exist", table));
        }

        let cursor = statistics(&self.conn, table)
            .map_err(|e| DbError::schema(format!("Index lookup failed: {}", e), table))?;
        let indexes = statistics_indexes(read_text_columns(cursor, STATISTICS_COLS)?, table);

        Ok(TableSchema::from_catalog(fields, &indexes))
    }
}
