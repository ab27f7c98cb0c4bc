//! The database executor capability.
//!
//! Everything above this module sees the server only through the
//! [`Executor`] trait: a statement goes in, normalized [`Row`]s come out.
//! Driver-native values are coerced to [`Value`] before they leave the
//! executor, so task runners never touch driver types.

use crate::Result;
use async_trait::async_trait;

#[cfg(feature = "mssql")]
mod coercion;
#[cfg(feature = "mssql")]
pub mod mssql;

/// Label of the synthetic row returned for statements that produce no rows.
pub const ROWS_AFFECTED: &str = "rowsAffected";

/// A normalized scalar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Bit columns
    Bool(bool),
    /// Everything else, already rendered as text
    Text(String),
}

impl Value {
    /// Returns the text form unless the value is NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Parses the value as an integer count.
    pub fn as_count(&self) -> Option<i64> {
        match self {
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map_or(Self::Null, Self::Text)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// One result row: column labels mapped to values, in server column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// The synthetic `{rowsAffected: N}` row.
    pub fn rows_affected(count: u64) -> Self {
        Self::new().with(ROWS_AFFECTED, count.to_string())
    }

    /// Builder form of [`Row::push`].
    pub fn with(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(label, value);
        self
    }

    /// Appends a column; a repeated label replaces the earlier value.
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<Value>) {
        let label = label.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((label, value)),
        }
    }

    /// Looks up a column by label.
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    /// Iterates columns in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(l, v)| (l.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{ ")?;
        for (i, (label, value)) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::Text(s) => write!(f, "{}: '{}'", label, s)?,
                other => write!(f, "{}: {}", label, other)?,
            }
        }
        f.write_str(" }")
    }
}

/// A bound statement parameter.
///
/// Parameters bind positionally as `@P1..@Pn` in the order given; `name`
/// only labels the value in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    /// Descriptive name
    pub name: String,
    /// Value bound as NVARCHAR
    pub value: String,
}

impl QueryParam {
    /// Creates a parameter.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Executes statements on one live connection.
///
/// Implementations own the connection, so calls take `&mut self`; the
/// engine never has more than one statement outstanding.
#[async_trait]
pub trait Executor: Send {
    /// Runs a row-returning statement.
    ///
    /// Rows of every result set are returned in order, flattened.
    ///
    /// # Errors
    /// Returns [`crate::ProbeError::QueryExecution`] if the server rejects
    /// the statement, the request times out, or the connection drops
    async fn query(&mut self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>>;

    /// Runs a statement that returns no rows, such as `USE`.
    ///
    /// Returns the single synthetic row `{rowsAffected: N}`.
    ///
    /// # Errors
    /// Same as [`Executor::query`]
    async fn execute(&mut self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_preserves_column_order() {
        let row = Row::new().with("Status", "open").with("count", "3");
        let labels: Vec<&str> = row.iter().map(|(l, _)| l).collect();

        assert_eq!(labels, vec!["Status", "count"]);
        assert_eq!(row.get("count"), Some(&Value::from("3")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_row_repeated_label_replaces_value() {
        let mut row = Row::new().with("a", "1");
        row.push("a", "2");

        assert_eq!(row.len(), 1);
        assert_eq!(row.get("a"), Some(&Value::from("2")));
    }

    #[test]
    fn test_rows_affected_marker() {
        let row = Row::rows_affected(7);
        assert_eq!(row.get(ROWS_AFFECTED).and_then(Value::as_count), Some(7));
    }

    #[test]
    fn test_value_rendering() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::Null.as_text(), None);
        assert_eq!(Value::from(" 42 ").as_count(), Some(42));
        assert_eq!(Value::Bool(true).as_count(), None);
    }

    #[test]
    fn test_row_display() {
        let row = Row::new()
            .with("Name", "Orders")
            .with("Nullable", Value::Null)
            .with("Identity", true);
        assert_eq!(
            row.to_string(),
            "{ Name: 'Orders', Nullable: null, Identity: true }"
        );
    }
}
