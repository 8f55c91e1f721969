//! Text rendering for tool results.
//!
//! Every tool returns a single text payload. Row sets render as a JSON array
//! (default), an ASCII table or a Markdown table.

use crate::error::{DbError, DbResult};
use crate::models::{QueryResult, ResultRow, ScalarValue, TableSchema};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Output format for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array of row objects (default)
    #[default]
    Json,
    /// ASCII table format (like MySQL CLI)
    Table,
    /// Markdown table format
    Markdown,
}

/// Render a row set in the requested format.
pub fn render_rows(result: &QueryResult, format: OutputFormat) -> DbResult<String> {
    match format {
        OutputFormat::Json => format_as_json(&result.rows),
        OutputFormat::Table => Ok(format_as_table(
            &result.columns,
            &result.rows,
            result.execution_time_ms,
        )),
        OutputFormat::Markdown => Ok(format_as_markdown(&result.columns, &result.rows)),
    }
}

pub fn format_as_json(rows: &[ResultRow]) -> DbResult<String> {
    serde_json::to_string(rows)
        .map_err(|e| DbError::internal(format!("Failed to serialize rows: {}", e)))
}

/// Columns as they appear in rendered tables.
///
/// Duplicate names collapse onto one key in each row, so each name is shown once.
fn display_columns(columns: &[String]) -> Vec<&str> {
    let mut seen = Vec::with_capacity(columns.len());
    for name in columns {
        if !seen.contains(&name.as_str()) {
            seen.push(name.as_str());
        }
    }
    seen
}

fn cell<'a>(row: &'a ResultRow, column: &str) -> &'a ScalarValue {
    row.get(column).unwrap_or(&ScalarValue::Null)
}

pub fn format_as_table(columns: &[String], rows: &[ResultRow], execution_time_ms: u64) -> String {
    let columns = display_columns(columns);
    if columns.is_empty() {
        return "Empty set".to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for row in rows {
        for (i, col) in columns.iter().enumerate() {
            widths[i] = widths[i].max(cell(row, col).to_string().width());
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {} ", pad_center(col, *w)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in rows {
        let row_str: String = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| {
                let value = cell(row, col);
                let formatted = value.to_string();
                if value.is_numeric() {
                    format!("| {} ", pad_left(&formatted, *w))
                } else {
                    format!("| {} ", pad_right(&formatted, *w))
                }
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&separator);

    let row_text = if rows.len() == 1 { "row" } else { "rows" };
    output.push_str(&format!(
        "{} {} in set ({:.2} sec)\n",
        rows.len(),
        row_text,
        execution_time_ms as f64 / 1000.0
    ));

    output
}

pub fn format_as_markdown(columns: &[String], rows: &[ResultRow]) -> String {
    let columns = display_columns(columns);
    if columns.is_empty() {
        return "*Empty set*".to_string();
    }

    let mut output = String::new();

    let header: String = columns
        .iter()
        .map(|c| format!("| {} ", escape_markdown(c)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);

    let sep: String = columns.iter().map(|_| "|---").collect::<String>() + "|\n";
    output.push_str(&sep);

    for row in rows {
        let row_str: String = columns
            .iter()
            .map(|col| format!("| {} ", escape_markdown(&cell(row, col).to_string())))
            .collect::<String>()
            + "|\n";
        output.push_str(&row_str);
    }

    output.push_str(&format!("\n*{} rows*", rows.len()));

    output
}

/// `Tables: [a, b]`
pub fn render_tables(names: &[String]) -> String {
    format!("Tables: [{}]", names.join(", "))
}

/// `Schema for <table>: {"fields":[..],"primaryKey":[..]}`
pub fn render_schema(table: &str, schema: &TableSchema) -> DbResult<String> {
    let json = serde_json::to_string(schema)
        .map_err(|e| DbError::internal(format!("Failed to serialize schema: {}", e)))?;
    Ok(format!("Schema for {}: {}", table, json))
}

/// `Rows affected: N`
pub fn render_rows_affected(rows_affected: u64) -> String {
    format!("Rows affected: {}", rows_affected)
}

// `{:^w$}` pads by char count; these pad by display width so CJK text lines up.

fn pad_right(s: &str, width: usize) -> String {
    format!("{}{}", s, " ".repeat(width.saturating_sub(s.width())))
}

fn pad_left(s: &str, width: usize) -> String {
    format!("{}{}", " ".repeat(width.saturating_sub(s.width())), s)
}

fn pad_center(s: &str, width: usize) -> String {
    let gap = width.saturating_sub(s.width());
    let left = gap / 2;
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(gap - left))
}

fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::build_row;

    fn sample() -> QueryResult {
        QueryResult {
            columns: vec!["ID".into(), "Name".into()],
            rows: vec![
                build_row(vec![
                    ("ID".to_string(), ScalarValue::Integer(1)),
                    ("Name".to_string(), ScalarValue::from("Alice")),
                ]),
                build_row(vec![
                    ("ID".to_string(), ScalarValue::Integer(22)),
                    ("Name".to_string(), ScalarValue::Null),
                ]),
            ],
            execution_time_ms: 1500,
        }
    }

    #[test]
    fn test_json_rows() {
        let text = render_rows(&sample(), OutputFormat::Json).unwrap();
        assert_eq!(text, r#"[{"ID":1,"Name":"Alice"},{"ID":22,"Name":null}]"#);
    }

    #[test]
    fn test_json_empty() {
        let text = render_rows(&QueryResult::default(), OutputFormat::Json).unwrap();
        assert_eq!(text, "[]");
    }

    #[test]
    fn test_table_layout() {
        let text = render_rows(&sample(), OutputFormat::Table).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "+----+-------+");
        assert_eq!(lines[1], "| ID | Name  |");
        assert_eq!(lines[3], "|  1 | Alice |");
        assert_eq!(lines[4], "| 22 | NULL  |");
        assert_eq!(lines[6], "2 rows in set (1.50 sec)");
    }

    #[test]
    fn test_table_wide_characters() {
        let result = QueryResult {
            columns: vec!["名前".into()],
            rows: vec![build_row(vec![("名前".to_string(), ScalarValue::from("a"))])],
            execution_time_ms: 0,
        };
        let text = format_as_table(&result.columns, &result.rows, 0);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0].width(), lines[1].width());
        assert_eq!(lines[3], "| a    |");
    }

    #[test]
    fn test_table_no_columns() {
        assert_eq!(format_as_table(&[], &[], 0), "Empty set");
    }

    #[test]
    fn test_markdown() {
        let text = render_rows(&sample(), OutputFormat::Markdown).unwrap();
        assert!(text.starts_with("| ID | Name |\n|---|---|\n"));
        assert!(text.contains("| 1 | Alice |"));
        assert!(text.ends_with("*2 rows*"));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let rows = vec![build_row(vec![("a".to_string(), ScalarValue::from("x|y"))])];
        let text = format_as_markdown(&["a".to_string()], &rows);
        assert!(text.contains("| x\\|y |"));
    }

    #[test]
    fn test_duplicate_columns_shown_once() {
        let rows = vec![build_row(vec![
            ("a".to_string(), ScalarValue::Integer(1)),
            ("a".to_string(), ScalarValue::Integer(2)),
        ])];
        let text = format_as_markdown(&["a".to_string(), "a".to_string()], &rows);
        assert!(text.starts_with("| a |\n"));
        assert!(text.contains("| 2 |"));
    }

    #[test]
    fn test_render_tables() {
        assert_eq!(
            render_tables(&["Customers".to_string(), "Orders".to_string()]),
            "Tables: [Customers, Orders]"
        );
        assert_eq!(render_tables(&[]), "Tables: []");
    }

    #[test]
    fn test_render_schema() {
        let schema = TableSchema {
            fields: vec!["ID".into(), "Name".into()],
            primary_key: vec!["ID".into()],
        };
        assert_eq!(
            render_schema("Customers", &schema).unwrap(),
            r#"Schema for Customers: {"fields":["ID","Name"],"primaryKey":["ID"]}"#
        );
    }

    #[test]
    fn test_render_rows_affected() {
        assert_eq!(render_rows_affected(3), "Rows affected: 3");
    }

    #[test]
    fn test_output_format_default_is_json() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
        let f: OutputFormat = serde_json::from_str("\"markdown\"").unwrap();
        assert_eq!(f, OutputFormat::Markdown);
    }
}
