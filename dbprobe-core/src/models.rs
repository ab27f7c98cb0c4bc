//! Core data models: table identity, catalog topology, and task results.

use crate::error::ProbeError;
use crate::executor::{Row, Value};
use crate::sql::quote_multipart;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fully-qualified table identity.
///
/// Renders as `catalog.schema.table`; that string is the grouping key and
/// the first column of every report line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl TableId {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Bracket-quoted three-part name for SQL text, e.g. `[Sales].[dbo].[Orders]`.
    pub fn quoted(&self) -> String {
        quote_multipart(&[&self.catalog, &self.schema, &self.table])
    }

    /// Bracket-quoted `[schema].[table]`, resolved in the active catalog.
    pub fn quoted_local(&self) -> String {
        quote_multipart(&[&self.schema, &self.table])
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

/// One table and its eligible columns, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns {
    pub table: TableId,
    pub columns: Vec<String>,
}

/// Tables of one catalog, in the server's discovery order.
///
/// A table only appears once it has at least one column, and each table
/// appears exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    catalog: String,
    tables: Vec<TableColumns>,
    index: HashMap<String, usize>,
}

impl Topology {
    /// Creates an empty topology for a catalog.
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            ..Default::default()
        }
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Seals a table's accumulated columns into the topology.
    ///
    /// An empty column list is ignored. Sealing a table a second time
    /// appends to its existing entry rather than creating a duplicate.
    pub fn insert(&mut self, table: TableId, columns: Vec<String>) {
        if columns.is_empty() {
            return;
        }

        let key = table.to_string();
        match self.index.get(&key) {
            Some(&slot) => self.tables[slot].columns.extend(columns),
            None => {
                self.index.insert(key, self.tables.len());
                self.tables.push(TableColumns { table, columns });
            }
        }
    }

    /// Tables in insertion order.
    pub fn tables(&self) -> &[TableColumns] {
        &self.tables
    }

    /// Looks up a table by its dotted identifier.
    pub fn get(&self, table_id: &str) -> Option<&TableColumns> {
        self.index.get(table_id).map(|&slot| &self.tables[slot])
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

/// Outcome of one table's count query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableCount {
    /// The row count, as text
    Rows(String),
    /// The server's error message
    Failed(String),
}

impl TableCount {
    /// The count, or the error message in its place.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rows(s) | Self::Failed(s) => s,
        }
    }
}

/// Counts task output for one catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountsResult {
    pub tables: Vec<(TableId, TableCount)>,
}

/// Outcome of one table's description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableDescription {
    /// Result rows of the describe procedure, one rendered row per line
    Text(String),
    /// The server's error message
    Failed(String),
}

impl TableDescription {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Failed(s) => s,
        }
    }
}

/// Descriptions task output for one catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionsResult {
    pub tables: Vec<(TableId, TableDescription)>,
}

/// One group of a column histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramBucket {
    /// Column the bucket belongs to
    pub column: String,
    /// The string-cast value; `Null` for the NULL group
    pub value: Value,
    /// Occurrences of the value
    pub count: String,
}

/// A histogram bucket, or the failure of a column's histogram query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistogramEntry {
    Bucket(HistogramBucket),
    Failed { column: String, message: String },
}

impl HistogramEntry {
    /// Column the entry belongs to.
    pub fn column(&self) -> &str {
        match self {
            Self::Bucket(bucket) => &bucket.column,
            Self::Failed { column, .. } => column,
        }
    }
}

/// Histograms task output for one catalog.
///
/// Entries of a table are contiguous per column, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistogramsResult {
    pub tables: Vec<(TableId, Vec<HistogramEntry>)>,
}

/// Search task output for one catalog.
///
/// `rows` holds one `{ "<table>.<column>": count }` row per column with a
/// positive count. `error` is set when a query failed and the search
/// stopped early; `rows` then holds what was found before the failure.
#[derive(Debug, Default)]
pub struct SearchResult {
    pub rows: Vec<Row>,
    pub error: Option<ProbeError>,
}

impl SearchResult {
    /// True when the search stopped on an error.
    pub fn aborted(&self) -> bool {
        self.error.is_some()
    }
}
