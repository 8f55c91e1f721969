//! Schema-related data models.
//!
//! This module defines types for catalog introspection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog object kind as reported by the `Type` property of an ADOX table
/// or the `TABLE_TYPE` column of `SQLTables`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableKind {
    Table,
    View,
    SystemTable,
    AccessTable,
    Link,
    PassThrough,
    Other(String),
}

impl TableKind {
    /// Classify a catalog type string. Only the exact string `TABLE` is a user table.
    pub fn from_catalog(type_name: &str) -> Self {
        match type_name {
            "TABLE" => Self::Table,
            "VIEW" => Self::View,
            "SYSTEM TABLE" => Self::SystemTable,
            "ACCESS TABLE" => Self::AccessTable,
            "LINK" => Self::Link,
            "PASS-THROUGH" => Self::PassThrough,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_user_table(&self) -> bool {
        matches!(self, Self::Table)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "TABLE"),
            Self::View => write!(f, "VIEW"),
            Self::SystemTable => write!(f, "SYSTEM TABLE"),
            Self::AccessTable => write!(f, "ACCESS TABLE"),
            Self::Link => write!(f, "LINK"),
            Self::PassThrough => write!(f, "PASS-THROUGH"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One entry of a catalog's table collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: TableKind,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, type_name: &str) -> Self {
        Self {
            name: name.into(),
            kind: TableKind::from_catalog(type_name),
        }
    }
}

/// One entry of a table's index collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIndex {
    pub name: String,
    pub primary_key: bool,
    /// Member columns in index order
    pub columns: Vec<String>,
}

/// Columns and primary key of a single table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Column names in catalog order
    pub fields: Vec<String>,
    /// Empty when the table has no primary key
    pub primary_key: Vec<String>,
}

impl TableSchema {
    /// Assemble a schema from a table's columns and indexes.
    ///
    /// Every index flagged as primary contributes its columns, in index order.
    pub fn from_catalog(columns: Vec<String>, indexes: &[CatalogIndex]) -> Self {
        let primary_key = indexes
            .iter()
            .filter(|idx| idx.primary_key)
            .flat_map(|idx| idx.columns.iter().cloned())
            .collect();
        Self {
            fields: columns,
            primary_key,
        }
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }
}

/// Keep only user tables, in catalog order.
pub fn user_table_names(entries: Vec<CatalogEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|entry| entry.kind.is_user_table())
        .map(|entry| entry.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(name: &str, primary_key: bool, columns: &[&str]) -> CatalogIndex {
        CatalogIndex {
            name: name.to_string(),
            primary_key,
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_table_kind_exact_match() {
        assert!(TableKind::from_catalog("TABLE").is_user_table());
        assert!(!TableKind::from_catalog("table").is_user_table());
        assert!(!TableKind::from_catalog("SYSTEM TABLE").is_user_table());
        assert!(!TableKind::from_catalog("VIEW").is_user_table());
        assert_eq!(TableKind::from_catalog("SYNONYM").to_string(), "SYNONYM");
    }

    #[test]
    fn test_user_table_names_filters_and_keeps_order() {
        let entries = vec![
            CatalogEntry::new("Zebra", "TABLE"),
            CatalogEntry::new("MSysObjects", "SYSTEM TABLE"),
            CatalogEntry::new("qryTotals", "VIEW"),
            CatalogEntry::new("Linked", "LINK"),
            CatalogEntry::new("Apple", "TABLE"),
        ];
        assert_eq!(user_table_names(entries), vec!["Zebra", "Apple"]);
    }

    #[test]
    fn test_schema_single_column_primary_key() {
        let schema = TableSchema::from_catalog(
            vec!["ID".into(), "Name".into(), "Email".into()],
            &[index("Email", false, &["Email"]), index("PrimaryKey", true, &["ID"])],
        );
        assert_eq!(schema.fields, vec!["ID", "Name", "Email"]);
        assert_eq!(schema.primary_key, vec!["ID"]);
    }

    #[test]
    fn test_schema_composite_primary_key_keeps_index_order() {
        let schema = TableSchema::from_catalog(
            vec!["A".into(), "B".into()],
            &[index("PrimaryKey", true, &["B", "A"])],
        );
        assert_eq!(schema.primary_key, vec!["B", "A"]);
    }

    #[test]
    fn test_schema_without_primary_key() {
        let schema = TableSchema::from_catalog(vec!["Note".into()], &[index("ix", false, &["Note"])]);
        assert!(!schema.has_primary_key());
        assert_eq!(schema.fields.len(), 1);
    }

    #[test]
    fn test_schema_multiple_primary_indexes_all_appended() {
        let schema = TableSchema::from_catalog(
            vec!["A".into(), "B".into()],
            &[index("pk1", true, &["A"]), index("pk2", true, &["B"])],
        );
        assert_eq!(schema.primary_key, vec!["A", "B"]);
    }

    #[test]
    fn test_schema_serializes_camel_case() {
        let schema = TableSchema {
            fields: vec!["ID".into()],
            primary_key: vec![],
        };
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"{"fields":["ID"],"primaryKey":[]}"#);
    }
}
