//! Catalog and table/column discovery.
//!
//! Discovery is never cached: each task re-reads the catalog list and
//! each catalog's columns, so results follow the live schema.

use crate::error::{ProbeError, Result};
use crate::executor::{Executor, Row, Value};
use crate::models::{TableId, Topology};
use crate::pattern::{GlobPattern, matches_any};
use crate::sql::{LIST_CATALOGS, SYSTEM_CATALOGS, list_columns, use_catalog};

/// Which catalogs a run visits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Also visit `master`, `tempdb`, `model` and `msdb`
    pub include_system: bool,
    /// Catalog name patterns to skip
    pub exclude: Vec<GlobPattern>,
}

impl CatalogFilter {
    /// True if the catalog should be visited.
    pub fn accepts(&self, catalog: &str) -> bool {
        if !self.include_system
            && SYSTEM_CATALOGS
                .iter()
                .any(|system| system.eq_ignore_ascii_case(catalog))
        {
            return false;
        }
        !matches_any(&self.exclude, catalog)
    }
}

/// Lists the catalogs to visit, in server order.
///
/// # Errors
/// Returns [`ProbeError::Catalog`] if the catalog query fails
pub async fn list_catalogs<E>(executor: &mut E, filter: &CatalogFilter) -> Result<Vec<String>>
where
    E: Executor + ?Sized,
{
    tracing::info!("{}", LIST_CATALOGS);
    let rows = executor
        .query(LIST_CATALOGS, &[])
        .await
        .map_err(|e| ProbeError::catalog_failed("Failed to list catalogs", e))?;

    let mut catalogs = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(name) = row.get("name").and_then(Value::as_text) else {
            tracing::warn!("Ignoring catalog row without a name: {}", row);
            continue;
        };

        if filter.accepts(&name) {
            catalogs.push(name);
        } else {
            tracing::debug!("Filtering catalog '{}'", name);
        }
    }

    tracing::info!(
        "Discovered {} catalogs ({} filtered)",
        catalogs.len(),
        rows.len() - catalogs.len()
    );
    Ok(catalogs)
}

/// Makes `catalog` the connection's active catalog.
///
/// # Errors
/// Returns [`ProbeError::Topology`] if the server refuses the switch
pub async fn select_catalog<E>(executor: &mut E, catalog: &str) -> Result<()>
where
    E: Executor + ?Sized,
{
    let statement = use_catalog(catalog);
    tracing::info!("{}", statement);
    executor
        .execute(&statement, &[])
        .await
        .map(|_| ())
        .map_err(|e| ProbeError::topology_failed(catalog, e))
}

/// Loads the table/column topology of `catalog`.
///
/// # Errors
/// Returns [`ProbeError::Topology`] if the discovery query fails
pub async fn load_topology<E>(executor: &mut E, catalog: &str) -> Result<Topology>
where
    E: Executor + ?Sized,
{
    let statement = list_columns(catalog);
    tracing::info!("{}", statement);
    let rows = executor
        .query(&statement, &[])
        .await
        .map_err(|e| ProbeError::topology_failed(catalog, e))?;

    let topology = fold_topology(catalog, &rows);
    tracing::debug!(
        "Catalog '{}': {} tables, {} columns",
        catalog,
        topology.len(),
        topology.column_count()
    );
    Ok(topology)
}

/// Groups `(TABLE_SCHEMA, TABLE_NAME, COLUMN_NAME)` rows by table.
///
/// Rows must arrive ordered by schema and table. Columns keep their row
/// order. No rows yields an empty topology.
pub fn fold_topology(catalog: &str, rows: &[Row]) -> Topology {
    let mut topology = Topology::new(catalog);
    let mut current: Option<TableId> = None;
    let mut columns: Vec<String> = Vec::new();

    for row in rows {
        let (Some(schema), Some(table), Some(column)) = (
            field(row, "TABLE_SCHEMA"),
            field(row, "TABLE_NAME"),
            field(row, "COLUMN_NAME"),
        ) else {
            tracing::warn!("Ignoring malformed discovery row: {}", row);
            continue;
        };

        let id = TableId::new(catalog, schema, table);
        if current.as_ref() != Some(&id) {
            if let Some(sealed) = current.replace(id) {
                topology.insert(sealed, std::mem::take(&mut columns));
            }
        }
        columns.push(column);
    }

    if let Some(sealed) = current {
        topology.insert(sealed, columns);
    }

    topology
}

fn field(row: &Row, label: &str) -> Option<String> {
    row.get(label).and_then(Value::as_text)
}
