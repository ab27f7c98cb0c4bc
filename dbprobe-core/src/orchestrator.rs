//! Drives the requested tasks over every catalog on one connection.
//!
//! For each task, in order: print the task header, list the catalogs,
//! then for each catalog select it, load its topology, run the task and
//! report. Everything runs sequentially on the caller's executor.
//!
//! Failure policy:
//! - Catalog list failure is fatal and ends the run
//! - Catalog selection or topology failure skips that catalog only
//! - A search failure ends that catalog's search; partial rows are reported
//! - Per-table and per-column failures are part of the task results

use crate::error::{ProbeError, Result};
use crate::executor::Executor;
use crate::report::Reporter;
use crate::tasks::{
    HistogramOptions, SearchRequest, Task, TaskSet, run_counts, run_descriptions, run_histograms,
    run_search,
};
use crate::topology::{CatalogFilter, list_catalogs, load_topology, select_catalog};
use serde::Serialize;
use std::io::Write;
use tracing::Instrument;

/// What a run does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub tasks: TaskSet,
    /// Required when `tasks` contains [`Task::Search`]
    pub search: Option<SearchRequest>,
    pub histogram: HistogramOptions,
    pub catalogs: CatalogFilter,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tasks: TaskSet::default_tasks(),
            search: None,
            histogram: HistogramOptions::default(),
            catalogs: CatalogFilter::default(),
        }
    }
}

impl RunOptions {
    /// Checks the options are consistent.
    ///
    /// # Errors
    /// Returns a configuration error if no task is requested, or if search
    /// is requested without a term
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(ProbeError::configuration(format!(
                "No task requested, expected one or more of: {}",
                Task::supported()
            )));
        }

        if self.tasks.contains(Task::Search) && self.search.is_none() {
            return Err(ProbeError::configuration(
                "The search task requires a --search term",
            ));
        }

        Ok(())
    }
}

/// Totals for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Tasks run
    pub tasks_run: usize,
    /// Catalog visits that completed, summed over tasks
    pub catalogs_processed: usize,
    /// Catalog visits skipped on selection or topology failure
    pub catalogs_skipped: usize,
    /// Catalog searches stopped by a failed query
    pub search_aborts: usize,
    /// Report lines written, headers included
    pub lines_written: u64,
}

/// Runs every requested task and writes the report to `out`.
///
/// # Errors
/// Returns an error if the options are invalid, the catalog list cannot
/// be loaded, or the report cannot be written
pub async fn run<E, W>(executor: &mut E, options: &RunOptions, out: W) -> Result<RunSummary>
where
    E: Executor + ?Sized,
    W: Write,
{
    options.validate()?;

    let mut reporter = Reporter::new(out);
    let mut summary = RunSummary::default();

    for task in options.tasks.iter() {
        let span = tracing::info_span!("task", task = %task);
        run_task(executor, options, task, &mut reporter, &mut summary)
            .instrument(span)
            .await?;
        summary.tasks_run += 1;
    }

    summary.lines_written = reporter.lines_written();
    Ok(summary)
}

async fn run_task<E, W>(
    executor: &mut E,
    options: &RunOptions,
    task: Task,
    reporter: &mut Reporter<W>,
    summary: &mut RunSummary,
) -> Result<()>
where
    E: Executor + ?Sized,
    W: Write,
{
    tracing::info!("Starting task {}", task);
    reporter.write_header(task)?;
    reporter.flush()?;

    let catalogs = list_catalogs(executor, &options.catalogs).await?;

    for catalog in &catalogs {
        let span = tracing::info_span!("catalog", catalog = %catalog);
        let outcome = run_catalog(executor, options, task, catalog, reporter, summary)
            .instrument(span)
            .await;

        match outcome {
            Ok(()) => summary.catalogs_processed += 1,
            Err(e @ ProbeError::Topology { .. }) => {
                tracing::error!("Skipping catalog '{}': {}: {}", catalog, e, e.cause_message());
                summary.catalogs_skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

async fn run_catalog<E, W>(
    executor: &mut E,
    options: &RunOptions,
    task: Task,
    catalog: &str,
    reporter: &mut Reporter<W>,
    summary: &mut RunSummary,
) -> Result<()>
where
    E: Executor + ?Sized,
    W: Write,
{
    select_catalog(executor, catalog).await?;
    let topology = load_topology(executor, catalog).await?;

    if topology.is_empty() {
        tracing::info!("Catalog '{}' has no eligible columns", catalog);
        return Ok(());
    }

    match task {
        Task::Counts => {
            let result = run_counts(executor, &topology).await;
            reporter.write_counts(&result)
        }
        Task::Descs => {
            let result = run_descriptions(executor, &topology).await;
            reporter.write_descriptions(&result)
        }
        Task::Histograms => {
            let result = run_histograms(executor, &topology, &options.histogram).await;
            reporter.write_histograms(&result)
        }
        Task::Search => {
            let request = options.search.as_ref().ok_or_else(|| {
                ProbeError::configuration("The search task requires a --search term")
            })?;
            let result = run_search(executor, &topology, request).await;
            reporter.write_search(&result)?;

            if let Some(e) = &result.error {
                tracing::warn!(
                    "Search of '{}' stopped early after {} matches: {}",
                    catalog,
                    result.rows.len(),
                    e.cause_message()
                );
                summary.search_aborts += 1;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_are_valid() {
        assert!(RunOptions::default().validate().is_ok());
    }

    #[test]
    fn test_search_task_requires_term() {
        let options = RunOptions {
            tasks: [Task::Search].into_iter().collect(),
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("--search"));
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
    }

    #[test]
    fn test_empty_task_set_is_rejected() {
        let options = RunOptions {
            tasks: TaskSet::default(),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
