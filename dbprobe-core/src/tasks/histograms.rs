//! Most frequent values per column.

use super::HistogramOptions;
use crate::executor::{Executor, Value};
use crate::models::{HistogramBucket, HistogramEntry, HistogramsResult, TableId, Topology};
use crate::sql::cast_to_varchar;

/// Builds the top-N grouping query for one column.
///
/// ```rust
/// use dbprobe_core::{HistogramOptions, TableId};
/// use dbprobe_core::tasks::histogram_query;
///
/// let orders = TableId::new("Sales", "dbo", "Orders");
/// let sql = histogram_query(&orders, "Status", &HistogramOptions::default());
/// assert!(sql.starts_with("SELECT TOP (100) CAST([Status] AS VARCHAR(80)) AS [value]"));
/// ```
pub fn histogram_query(table: &TableId, column: &str, options: &HistogramOptions) -> String {
    let cast = cast_to_varchar(column, options.cast_width);
    format!(
        "SELECT TOP ({top}) {cast} AS [value], COUNT(1) AS [count] \
         FROM {table} \
         GROUP BY {cast} \
         ORDER BY COUNT(1) DESC",
        top = options.top_n,
        cast = cast,
        table = table.quoted(),
    )
}

/// Builds value histograms for every eligible column of every table.
///
/// Excluded columns never generate a query. A failed column query is
/// recorded as a [`HistogramEntry::Failed`] for that column and the run
/// continues with the next column.
pub async fn run_histograms<E>(
    executor: &mut E,
    topology: &Topology,
    options: &HistogramOptions,
) -> HistogramsResult
where
    E: Executor + ?Sized,
{
    let mut result = HistogramsResult::default();

    for entry in topology.tables() {
        let mut entries = Vec::new();

        for column in &entry.columns {
            if options.exclusions.excludes(&entry.table, column) {
                tracing::debug!("Skipping excluded column {}.{}", entry.table, column);
                continue;
            }

            let query = histogram_query(&entry.table, column, options);
            tracing::info!("{}", query);

            match executor.query(&query, &[]).await {
                Ok(rows) => {
                    for row in rows {
                        let Some(count) = row.get("count").and_then(Value::as_text) else {
                            continue;
                        };
                        entries.push(HistogramEntry::Bucket(HistogramBucket {
                            column: column.clone(),
                            value: row.get("value").cloned().unwrap_or(Value::Null),
                            count,
                        }));
                    }
                }
                Err(e) => {
                    tracing::warn!("Histogram failed for {}.{}: {}", entry.table, column, e);
                    entries.push(HistogramEntry::Failed {
                        column: column.clone(),
                        message: e.cause_message(),
                    });
                }
            }
        }

        result.tables.push((entry.table.clone(), entries));
    }

    result
}
