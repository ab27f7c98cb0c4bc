//! The four reporting tasks and their options.
//!
//! Each runner takes the executor and one catalog's [`crate::Topology`]
//! and returns a task-specific result. Counts, descriptions and histograms
//! record a failed table or column in place of its value and carry on;
//! search stops at the first failure.

mod counts;
mod descriptions;
mod histograms;
mod search;

pub use counts::run_counts;
pub use descriptions::run_descriptions;
pub use histograms::{histogram_query, run_histograms};
pub use search::{SearchQuery, build_search_query, run_search};

use crate::error::{ProbeError, Result};
use crate::models::TableId;
use crate::pattern::GlobPattern;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A reporting task.
///
/// The declaration order is the order tasks run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    Counts,
    Descs,
    Histograms,
    Search,
}

impl Task {
    /// Every task, in run order.
    pub const ALL: [Task; 4] = [Task::Counts, Task::Descs, Task::Histograms, Task::Search];

    /// Name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Task::Counts => "counts",
            Task::Descs => "descs",
            Task::Histograms => "histograms",
            Task::Search => "search",
        }
    }

    /// Comma-separated list of every task name.
    pub fn supported() -> String {
        Self::ALL.map(Task::name).join(", ")
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Task {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|task| task.name() == name)
            .ok_or_else(|| {
                ProbeError::configuration(format!(
                    "Task: {}, is not in the list of supported tasks: {}.",
                    name,
                    Task::supported()
                ))
            })
    }
}

/// The set of tasks requested for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSet {
    tasks: BTreeSet<Task>,
}

impl TaskSet {
    /// Parses a comma-separated task list.
    ///
    /// Returns the recognized tasks together with every unrecognized
    /// entry. Empty entries are ignored.
    ///
    /// ```rust
    /// use dbprobe_core::{Task, TaskSet};
    ///
    /// let (tasks, unknown) = TaskSet::parse("histograms,counts,bogus");
    /// assert_eq!(tasks.iter().collect::<Vec<_>>(), vec![Task::Counts, Task::Histograms]);
    /// assert_eq!(unknown, vec!["bogus".to_string()]);
    /// ```
    pub fn parse(list: &str) -> (Self, Vec<String>) {
        let mut set = Self::default();
        let mut unknown = Vec::new();

        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.parse::<Task>() {
                Ok(task) => set.insert(task),
                Err(_) => unknown.push(entry.to_string()),
            }
        }

        (set, unknown)
    }

    /// Tasks run when none are named: counts, descs and histograms.
    pub fn default_tasks() -> Self {
        let mut set = Self::default();
        set.insert(Task::Counts);
        set.insert(Task::Descs);
        set.insert(Task::Histograms);
        set
    }

    pub fn insert(&mut self, task: Task) {
        self.tasks.insert(task);
    }

    pub fn contains(&self, task: Task) -> bool {
        self.tasks.contains(&task)
    }

    /// Tasks in run order.
    pub fn iter(&self) -> impl Iterator<Item = Task> + '_ {
        self.tasks.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl FromIterator<Task> for TaskSet {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}

/// Skips histogram queries for matching `(table, column)` pairs.
///
/// The table pattern is matched against `catalog.schema.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRule {
    pub table: GlobPattern,
    pub column: GlobPattern,
}

impl ExclusionRule {
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: GlobPattern::new(table),
            column: GlobPattern::new(column),
        }
    }

    /// Parses `TABLE_GLOB:COLUMN_GLOB`, or a bare `COLUMN_GLOB` for every table.
    ///
    /// # Errors
    /// Returns a configuration error if either side is empty
    pub fn parse(spec: &str) -> Result<Self> {
        let (table, column) = match spec.trim().rsplit_once(':') {
            Some((table, column)) => (table.trim(), column.trim()),
            None => ("*", spec.trim()),
        };

        if table.is_empty() || column.is_empty() {
            return Err(ProbeError::configuration(format!(
                "Invalid exclusion '{}', expected TABLE_GLOB:COLUMN_GLOB",
                spec
            )));
        }

        Ok(Self::new(table, column))
    }

    pub fn matches(&self, table: &TableId, column: &str) -> bool {
        self.column.matches(column)
            && (self.table.matches_everything() || self.table.matches(&table.to_string()))
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.column)
    }
}

/// An ordered list of [`ExclusionRule`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    rules: Vec<ExclusionRule>,
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self {
            rules: vec![
                ExclusionRule::new("*", "next_val"),
                ExclusionRule::new("H70_AUDITTRAIL.dbo.sysdiagrams", "definition"),
            ],
        }
    }
}

impl ExclusionRules {
    /// No exclusions at all.
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: ExclusionRule) {
        self.rules.push(rule);
    }

    /// Parses and appends each `TABLE_GLOB:COLUMN_GLOB` entry.
    ///
    /// # Errors
    /// Returns the first parse failure
    pub fn extend_from_specs<S: AsRef<str>>(&mut self, specs: &[S]) -> Result<()> {
        for spec in specs {
            self.push(ExclusionRule::parse(spec.as_ref())?);
        }
        Ok(())
    }

    /// True if any rule excludes the column.
    pub fn excludes(&self, table: &TableId, column: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(table, column))
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }
}

/// Histogram tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramOptions {
    /// Most frequent groups kept per column
    pub top_n: u32,
    /// `VARCHAR` width values are cast to before grouping
    pub cast_width: u32,
    /// Columns never queried
    pub exclusions: ExclusionRules,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            top_n: 100,
            cast_width: 80,
            exclusions: ExclusionRules::default(),
        }
    }
}

/// A search term and how to match it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// The term, trimmed
    pub term: String,
    /// Also match as prefix, substring and suffix
    pub fuzzy: bool,
    /// `VARCHAR` width columns are cast to before comparing
    pub cast_width: u32,
}

impl SearchRequest {
    /// Default cast width for search comparisons.
    pub const DEFAULT_CAST_WIDTH: u32 = 800;

    /// Creates a request from a raw term.
    ///
    /// # Errors
    /// Returns a configuration error if the term is blank
    pub fn new(term: &str, fuzzy: bool) -> Result<Self> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ProbeError::configuration("search term cannot be empty"));
        }

        Ok(Self {
            term: term.to_string(),
            fuzzy,
            cast_width: Self::DEFAULT_CAST_WIDTH,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Task parsing
    // =========================================================================

    #[test]
    fn test_task_from_str() {
        assert_eq!("counts".parse::<Task>().unwrap(), Task::Counts);
        assert_eq!(" descs ".parse::<Task>().unwrap(), Task::Descs);

        let err = "Counts".parse::<Task>().unwrap_err();
        assert!(err.to_string().contains("Task: Counts, is not in the list"));
        assert!(err.to_string().contains("counts, descs, histograms, search"));
    }

    #[test]
    fn test_task_set_runs_in_fixed_order() {
        let (tasks, unknown) = TaskSet::parse("search,histograms,counts,counts");

        assert!(unknown.is_empty());
        assert_eq!(
            tasks.iter().collect::<Vec<_>>(),
            vec![Task::Counts, Task::Histograms, Task::Search]
        );
    }

    #[test]
    fn test_task_set_collects_every_unknown_entry() {
        let (tasks, unknown) = TaskSet::parse("counts,ids,,tables");

        assert!(tasks.contains(Task::Counts));
        assert_eq!(unknown, vec!["ids".to_string(), "tables".to_string()]);
    }

    #[test]
    fn test_default_tasks_exclude_search() {
        let tasks = TaskSet::default_tasks();
        assert!(tasks.contains(Task::Descs));
        assert!(!tasks.contains(Task::Search));
    }

    // =========================================================================
    // Exclusion rules
    // =========================================================================

    #[test]
    fn test_default_exclusions() {
        let rules = ExclusionRules::default();
        let audit = TableId::new("H70_AUDITTRAIL", "dbo", "sysdiagrams");
        let other = TableId::new("Sales", "dbo", "sysdiagrams");

        assert!(rules.excludes(&other, "next_val"));
        assert!(rules.excludes(&audit, "definition"));
        assert!(!rules.excludes(&other, "definition"));
        assert!(!rules.excludes(&other, "name"));
    }

    #[test]
    fn test_exclusion_rule_parse() {
        let rule = ExclusionRule::parse("Sales.*.Orders:Notes*").unwrap();
        assert!(rule.matches(&TableId::new("Sales", "dbo", "Orders"), "NotesLong"));
        assert!(!rule.matches(&TableId::new("HR", "dbo", "Orders"), "Notes"));

        let bare = ExclusionRule::parse("rowguid").unwrap();
        assert_eq!(bare.to_string(), "*:rowguid");

        assert!(ExclusionRule::parse("Sales.dbo.Orders:").is_err());
        assert!(ExclusionRule::parse(":col").is_err());
    }

    #[test]
    fn test_exclusion_rules_extend() {
        let mut rules = ExclusionRules::none();
        rules.extend_from_specs(&["*:ssn", "HR.dbo.People:salary"]).unwrap();

        assert_eq!(rules.rules().len(), 2);
        assert!(rules.excludes(&TableId::new("Sales", "dbo", "Customers"), "SSN"));
        assert!(!rules.excludes(&TableId::new("Sales", "dbo", "Customers"), "next_val"));
    }

    // =========================================================================
    // Options
    // =========================================================================

    #[test]
    fn test_histogram_defaults() {
        let options = HistogramOptions::default();
        assert_eq!(options.top_n, 100);
        assert_eq!(options.cast_width, 80);
    }

    #[test]
    fn test_search_request_trims_term() {
        let request = SearchRequest::new("  ACME  ", true).unwrap();
        assert_eq!(request.term, "ACME");
        assert_eq!(request.cast_width, 800);
        assert!(SearchRequest::new("   ", false).is_err());
    }
}
