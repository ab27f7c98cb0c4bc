//! Row count per table.

use crate::executor::{Executor, Value};
use crate::models::{CountsResult, TableCount, TableId, Topology};

/// Counts the rows of every table in the topology.
///
/// A failed count records the server's message in place of the count. A
/// table whose query returns no count row is left out.
pub async fn run_counts<E>(executor: &mut E, topology: &Topology) -> CountsResult
where
    E: Executor + ?Sized,
{
    let mut result = CountsResult::default();

    for entry in topology.tables() {
        if let Some(count) = count_table(executor, &entry.table).await {
            result.tables.push((entry.table.clone(), count));
        }
    }

    result
}

async fn count_table<E>(executor: &mut E, table: &TableId) -> Option<TableCount>
where
    E: Executor + ?Sized,
{
    let query = format!("SELECT COUNT(1) AS [count] FROM {}", table.quoted());
    tracing::info!("{}", query);

    match executor.query(&query, &[]).await {
        Ok(rows) => {
            let count = rows
                .iter()
                .filter_map(|row| row.get("count").and_then(Value::as_text))
                .last();
            if count.is_none() {
                tracing::warn!("Count query for {} returned no count", table);
            }
            count.map(|count| TableCount::Rows(count.trim_end().to_string()))
        }
        Err(e) => {
            tracing::warn!("Failed to count {}: {}", table, e);
            Some(TableCount::Failed(e.cause_message()))
        }
    }
}
