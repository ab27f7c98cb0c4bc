//! `sp_help` output per table.

use crate::executor::{Executor, QueryParam};
use crate::models::{DescriptionsResult, TableDescription, Topology};
use crate::sql::describe_object;

/// Describes every table in the topology with `sp_help`.
///
/// Each description is the rendered rows of every result set, one per
/// line. The object name is bound, not interpolated, and is schema
/// qualified; the procedure itself is called through the table's catalog.
pub async fn run_descriptions<E>(executor: &mut E, topology: &Topology) -> DescriptionsResult
where
    E: Executor + ?Sized,
{
    let mut result = DescriptionsResult::default();
    let statement = describe_object(topology.catalog());

    for entry in topology.tables() {
        let object_name = entry.table.quoted_local();
        let params = [QueryParam::new("objname", object_name.as_str())];
        tracing::info!("{} ({})", statement, object_name);

        let description = match executor.query(&statement, &params).await {
            Ok(rows) => {
                let lines: Vec<String> = rows.iter().map(ToString::to_string).collect();
                for line in &lines {
                    tracing::debug!("{}", line);
                }
                TableDescription::Text(lines.join("\n"))
            }
            Err(e) => {
                tracing::warn!("Failed to describe {}: {}", entry.table, e);
                TableDescription::Failed(e.cause_message())
            }
        };

        result.tables.push((entry.table.clone(), description));
    }

    result
}
