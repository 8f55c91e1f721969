//! In-memory `Database` used by the integration tests.
//!
//! Understands just enough SQL to exercise the tools:
//! `SELECT * FROM t`, `SELECT COUNT(*) AS n FROM t`, `INSERT INTO t VALUES (..)`,
//! `DELETE FROM t` and `DROP TABLE t`. Anything else is an execution error.

#![allow(dead_code)]

use access_mcp_server::db::Database;
use access_mcp_server::error::{DbError, DbResult};
use access_mcp_server::models::{
    ExecuteResult, QueryResult, ResultRow, ScalarValue, TableSchema, build_row,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub name: String,
    pub fields: Vec<String>,
    pub primary_key: Vec<String>,
    pub rows: Vec<Vec<ScalarValue>>,
}

impl FakeTable {
    pub fn new(name: &str, fields: &[&str], primary_key: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            fields: fields.iter().map(|s| s.to_string()).collect(),
            primary_key: primary_key.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<ScalarValue>) -> Self {
        self.rows.push(row);
        self
    }

    fn result_rows(&self) -> Vec<ResultRow> {
        self.rows
            .iter()
            .map(|values| build_row(self.fields.iter().cloned().zip(values.iter().cloned())))
            .collect()
    }
}

/// Database files keyed by path. Unknown paths fail to connect.
#[derive(Default)]
pub struct FakeDatabase {
    files: Mutex<HashMap<String, Vec<FakeTable>>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, tables: Vec<FakeTable>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), tables);
        self
    }

    fn with_tables<R>(
        &self,
        path: &str,
        op: impl FnOnce(&mut Vec<FakeTable>) -> DbResult<R>,
    ) -> DbResult<R> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(path) {
            Some(tables) => op(tables),
            None => Err(DbError::connection(
                format!(
                    "No provider available for '{}' (connection parameters restricted or driver missing)",
                    path
                ),
                "Check that the file exists",
            )),
        }
    }
}

fn find<'a>(tables: &'a mut [FakeTable], name: &str) -> DbResult<&'a mut FakeTable> {
    tables
        .iter_mut()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            DbError::database(
                format!(
                    "The Microsoft Access database engine cannot find the input table or query '{}'. State: 42S02",
                    name
                ),
                Some("42S02".to_string()),
                "Check the table name with list_tables",
            )
        })
}

fn syntax_error(sql: &str) -> DbError {
    DbError::database(
        format!("Syntax error in SQL statement: {} State: 42000", sql),
        Some("42000".to_string()),
        "Check the SQL syntax",
    )
}

fn words(sql: &str) -> Vec<String> {
    sql.split_whitespace()
        .map(|w| w.trim_end_matches(';').to_string())
        .collect()
}

fn parse_literal(text: &str) -> ScalarValue {
    let text = text.trim();
    if text.eq_ignore_ascii_case("null") {
        ScalarValue::Null
    } else if let Some(s) = text.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        ScalarValue::from(s)
    } else if let Ok(i) = text.parse::<i64>() {
        ScalarValue::Integer(i)
    } else if let Ok(f) = text.parse::<f64>() {
        ScalarValue::Float(f)
    } else {
        ScalarValue::from(text)
    }
}

impl Database for FakeDatabase {
    fn query(&self, path: &str, sql: &str) -> DbResult<QueryResult> {
        self.with_tables(path, |tables| {
            let w = words(sql);
            let upper: Vec<String> = w.iter().map(|s| s.to_uppercase()).collect();
            match upper.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
                ["SELECT", "*", "FROM", _] => {
                    let table = find(tables, &w[3])?;
                    Ok(QueryResult {
                        columns: table.fields.clone(),
                        rows: table.result_rows(),
                        execution_time_ms: 0,
                    })
                }
                ["SELECT", "COUNT(*)", "AS", _, "FROM", _] => {
                    let alias = w[3].clone();
                    let table = find(tables, &w[5])?;
                    let count = table.rows.len() as i64;
                    Ok(QueryResult {
                        columns: vec![alias.clone()],
                        rows: vec![build_row([(alias, ScalarValue::Integer(count))])],
                        execution_time_ms: 0,
                    })
                }
                _ => Err(syntax_error(sql)),
            }
        })
    }

    fn execute(&self, path: &str, sql: &str) -> DbResult<ExecuteResult> {
        self.with_tables(path, |tables| {
            let w = words(sql);
            let head: Vec<String> = w.iter().take(3).map(|s| s.to_uppercase()).collect();
            let rows_affected = match head.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
                ["DELETE", "FROM", _] => {
                    let table = find(tables, &w[2])?;
                    let n = table.rows.len();
                    table.rows.clear();
                    n
                }
                ["INSERT", "INTO", _] => {
                    let values = sql
                        .split_once('(')
                        .and_then(|(_, rest)| rest.rsplit_once(')'))
                        .map(|(inner, _)| inner)
                        .ok_or_else(|| syntax_error(sql))?;
                    let row: Vec<ScalarValue> = values.split(',').map(parse_literal).collect();
                    let table = find(tables, &w[2])?;
                    if row.len() != table.fields.len() {
                        return Err(syntax_error(sql));
                    }
                    table.rows.push(row);
                    1
                }
                ["DROP", "TABLE", _] => {
                    let before = tables.len();
                    tables.retain(|t| !t.name.eq_ignore_ascii_case(&w[2]));
                    if tables.len() == before {
                        return Err(syntax_error(sql));
                    }
                    0
                }
                _ => return Err(syntax_error(sql)),
            };
            Ok(ExecuteResult {
                rows_affected: rows_affected as u64,
                execution_time_ms: 0,
            })
        })
    }

    fn list_tables(&self, path: &str) -> DbResult<Vec<String>> {
        self.with_tables(path, |tables| Ok(tables.iter().map(|t| t.name.clone()).collect()))
    }

    fn table_schema(&self, path: &str, table: &str) -> DbResult<TableSchema> {
        self.with_tables(path, |tables| {
            tables
                .iter()
                .find(|t| t.name == table)
                .map(|t| TableSchema {
                    fields: t.fields.clone(),
                    primary_key: t.primary_key.clone(),
                })
                .ok_or_else(|| DbError::schema("Item cannot be found in the collection", table))
        })
    }
}

/// A small customers/orders file at `northwind.mdb` plus an empty file at `empty.mdb`.
pub fn northwind() -> FakeDatabase {
    FakeDatabase::new()
        .with_file(
            "northwind.mdb",
            vec![
                FakeTable::new("Customers", &["ID", "Name", "Active"], &["ID"])
                    .with_row(vec![
                        ScalarValue::Integer(1),
                        ScalarValue::from("Alice"),
                        ScalarValue::Boolean(true),
                    ])
                    .with_row(vec![
                        ScalarValue::Integer(2),
                        ScalarValue::Null,
                        ScalarValue::Boolean(false),
                    ]),
                FakeTable::new("Order Details", &["OrderID", "ProductID", "Qty"], &["OrderID", "ProductID"]),
                FakeTable::new("Notes", &["Body"], &[]),
            ],
        )
        .with_file("empty.mdb", Vec::new())
}
