//! Literal or substring search across every column.

use super::SearchRequest;
use crate::executor::{Executor, QueryParam, Row, Value};
use crate::models::{SearchResult, TableId, Topology};
use crate::sql::cast_to_varchar;

/// One column's search statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Statement text; the term only appears through parameters
    pub sql: String,
    /// Bound as `@P1..@Pn`
    pub params: Vec<QueryParam>,
    /// `catalog.schema.table.column`, the label reported for a match
    pub label: String,
}

/// Builds the match-count statement for one column.
///
/// Exact match always; prefix, substring and suffix `LIKE` matches are
/// added when the request is fuzzy. The count comes back as `[count]`;
/// labels can outgrow the 128-character identifier limit, so they never
/// reach the statement text.
pub fn build_search_query(table: &TableId, column: &str, request: &SearchRequest) -> SearchQuery {
    let label = format!("{}.{}", table, column);
    let cast = cast_to_varchar(column, request.cast_width);

    let mut params = vec![QueryParam::new("exact", request.term.as_str())];
    if request.fuzzy {
        params.push(QueryParam::new("prefix", format!("{}%", request.term)));
        params.push(QueryParam::new("contains", format!("%{}%", request.term)));
        params.push(QueryParam::new("suffix", format!("%{}", request.term)));
    }

    let predicates: Vec<String> = (1..=params.len())
        .map(|n| {
            let op = if n == 1 { "=" } else { "LIKE" };
            format!("{} {} @P{}", cast, op, n)
        })
        .collect();

    let sql = format!(
        "SELECT COUNT(1) AS [count] FROM {} WHERE {}",
        table.quoted(),
        predicates.join(" OR ")
    );

    SearchQuery { sql, params, label }
}

/// Searches every column of every table for the term.
///
/// Only columns with a positive match count produce a row, labelled
/// `catalog.schema.table.column`. The first failed query stops the
/// search; the result then carries the rows found so far and the error.
pub async fn run_search<E>(
    executor: &mut E,
    topology: &Topology,
    request: &SearchRequest,
) -> SearchResult
where
    E: Executor + ?Sized,
{
    let mut result = SearchResult::default();

    for entry in topology.tables() {
        for column in &entry.columns {
            let query = build_search_query(&entry.table, column, request);
            tracing::info!("{}", query.sql);

            match executor.query(&query.sql, &query.params).await {
                Ok(rows) => {
                    let count = rows.first().and_then(|row| row.get("count"));
                    if count.and_then(Value::as_count).unwrap_or(0) > 0 {
                        let count = count.cloned().unwrap_or(Value::Null);
                        result.rows.push(Row::new().with(query.label, count));
                    }
                }
                Err(e) => {
                    tracing::error!("Search stopped at {}: {}", query.label, e);
                    result.error = Some(e);
                    return result;
                }
            }
        }
    }

    result
}
