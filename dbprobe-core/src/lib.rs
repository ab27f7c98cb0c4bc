//! Core engine for dbprobe, a SQL Server inventory and spot-check tool.
//!
//! The crate discovers the catalog/table/column topology of a server and
//! drives one of four reporting tasks over it: row counts, table
//! descriptions, per-column value histograms, and a literal or substring
//! search across every column.
//!
//! # Architecture
//! - [`executor::Executor`] is the only seam to the database; the task
//!   runners and the orchestrator are generic over it.
//! - [`topology`] folds discovery rows into a [`models::Topology`].
//! - [`tasks`] holds the four runners, each isolating failures per table,
//!   per column or per catalog as its contract requires.
//! - [`report::Reporter`] renders task results as tab-separated lines.
//! - [`orchestrator::run`] walks every catalog sequentially on one
//!   connection.
//!
//! # Safety
//! - User-supplied values are always bound parameters
//! - Identifiers are bracket-quoted before they reach SQL text
//! - Credentials are zeroed on drop and never logged

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod pattern;
pub mod report;
pub mod sql;
pub mod tasks;
pub mod topology;

// Re-export commonly used types
pub use config::{ConnectionConfig, Credentials};
pub use error::{ProbeError, Result};
pub use executor::{Executor, QueryParam, Row, Value};
pub use logging::init_logging;
pub use models::{TableColumns, TableId, Topology};
pub use orchestrator::{RunOptions, RunSummary, run};
pub use report::Reporter;
pub use tasks::{ExclusionRule, ExclusionRules, HistogramOptions, SearchRequest, Task, TaskSet};
pub use topology::CatalogFilter;

#[cfg(feature = "mssql")]
pub use executor::mssql::MssqlExecutor;
