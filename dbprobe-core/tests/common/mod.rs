//! Shared test doubles for the task runners and the orchestrator.

#![allow(dead_code)]

use async_trait::async_trait;
use dbprobe_core::{Executor, ProbeError, QueryParam, Result, Row};

/// What a scripted statement returns.
#[derive(Debug, Clone)]
pub enum Outcome {
    Rows(Vec<Row>),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Rule {
    catalog: Option<String>,
    pattern: String,
    outcome: Outcome,
}

/// A statement the executor received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub sql: String,
    pub params: Vec<QueryParam>,
    /// Catalog selected by the last successful `USE`
    pub catalog: Option<String>,
}

/// In-memory [`Executor`] answering statements from a script.
///
/// Rules are checked in the order they were added; the first whose
/// pattern is a substring of the statement (and whose catalog, if any,
/// is the selected one) answers it. Unmatched queries return no rows.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    rules: Vec<Rule>,
    current_catalog: Option<String>,
    pub calls: Vec<Call>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers statements containing `pattern` with `rows`.
    pub fn on(mut self, pattern: &str, rows: Vec<Row>) -> Self {
        self.rules.push(Rule {
            catalog: None,
            pattern: pattern.to_string(),
            outcome: Outcome::Rows(rows),
        });
        self
    }

    /// Fails statements containing `pattern` with `message`.
    pub fn fail(mut self, pattern: &str, message: &str) -> Self {
        self.rules.push(Rule {
            catalog: None,
            pattern: pattern.to_string(),
            outcome: Outcome::Fail(message.to_string()),
        });
        self
    }

    /// Like [`ScriptedExecutor::on`], only while `catalog` is selected.
    pub fn on_in(mut self, catalog: &str, pattern: &str, rows: Vec<Row>) -> Self {
        self.rules.push(Rule {
            catalog: Some(catalog.to_string()),
            pattern: pattern.to_string(),
            outcome: Outcome::Rows(rows),
        });
        self
    }

    /// Like [`ScriptedExecutor::fail`], only while `catalog` is selected.
    pub fn fail_in(mut self, catalog: &str, pattern: &str, message: &str) -> Self {
        self.rules.push(Rule {
            catalog: Some(catalog.to_string()),
            pattern: pattern.to_string(),
            outcome: Outcome::Fail(message.to_string()),
        });
        self
    }

    /// Number of received statements containing `pattern`.
    pub fn count_calls(&self, pattern: &str) -> usize {
        self.calls.iter().filter(|c| c.sql.contains(pattern)).count()
    }

    fn answer(&mut self, sql: &str, params: &[QueryParam]) -> Option<Result<Vec<Row>>> {
        self.calls.push(Call {
            sql: sql.to_string(),
            params: params.to_vec(),
            catalog: self.current_catalog.clone(),
        });

        let rule = self.rules.iter().find(|rule| {
            sql.contains(&rule.pattern)
                && rule
                    .catalog
                    .as_ref()
                    .is_none_or(|c| self.current_catalog.as_ref() == Some(c))
        })?;

        Some(match &rule.outcome {
            Outcome::Rows(rows) => Ok(rows.clone()),
            Outcome::Fail(message) => Err(server_error(message)),
        })
    }
}

/// The error a server rejection surfaces as.
pub fn server_error(message: &str) -> ProbeError {
    ProbeError::query_failed(message, std::io::Error::other(message.to_string()))
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn query(&mut self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
        self.answer(sql, params).unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn execute(&mut self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>> {
        match self.answer(sql, params) {
            Some(Err(e)) => Err(e),
            _ => {
                if let Some(catalog) = parse_use(sql) {
                    self.current_catalog = Some(catalog);
                }
                Ok(vec![Row::rows_affected(0)])
            }
        }
    }
}

fn parse_use(sql: &str) -> Option<String> {
    let quoted = sql.strip_prefix("USE [")?.strip_suffix(']')?;
    Some(quoted.replace("]]", "]"))
}

// ============================================================================
// Row builders
// ============================================================================

/// Rows of the catalog list query.
pub fn catalog_rows(names: &[&str]) -> Vec<Row> {
    names.iter().map(|n| Row::new().with("name", *n)).collect()
}

/// Rows of the column discovery query, as `(schema, table, column)`.
pub fn column_rows(triples: &[(&str, &str, &str)]) -> Vec<Row> {
    triples
        .iter()
        .map(|(schema, table, column)| {
            Row::new()
                .with("TABLE_SCHEMA", *schema)
                .with("TABLE_NAME", *table)
                .with("COLUMN_NAME", *column)
        })
        .collect()
}

/// A single `{count: n}` row.
pub fn count_row(count: &str) -> Vec<Row> {
    vec![Row::new().with("count", count)]
}

/// Histogram rows as `(value, count)`.
pub fn histogram_rows(buckets: &[(&str, &str)]) -> Vec<Row> {
    buckets
        .iter()
        .map(|(value, count)| Row::new().with("value", *value).with("count", *count))
        .collect()
}
