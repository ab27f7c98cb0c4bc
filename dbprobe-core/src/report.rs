//! Tab-separated report output.
//!
//! Report lines go to the writer the [`Reporter`] wraps (standard output
//! in the binary); diagnostics never do.

use crate::error::{ProbeError, Result};
use crate::models::{
    CountsResult, DescriptionsResult, HistogramEntry, HistogramsResult, SearchResult,
};
use crate::tasks::Task;
use std::io::Write;

pub const COUNTS_HEADER: &str = "CATALOG.SCHEMA.TABLE\tCOUNT";
pub const DESCRIPTIONS_HEADER: &str = "CATALOG.SCHEMA.TABLE\tDESCRIPTION";
pub const HISTOGRAMS_HEADER: &str = "CATALOG.SCHEMA.TABLE\tCOLUMN\tROW\tVALUE\tCOUNT";
pub const SEARCH_HEADER: &str = "CATALOG.SCHEMA.TABLE.COLUMN\tCOUNT";

/// Header line printed once before a task's output.
pub fn header(task: Task) -> &'static str {
    match task {
        Task::Counts => COUNTS_HEADER,
        Task::Descs => DESCRIPTIONS_HEADER,
        Task::Histograms => HISTOGRAMS_HEADER,
        Task::Search => SEARCH_HEADER,
    }
}

/// Writes task results as tab-separated lines.
pub struct Reporter<W: Write> {
    out: W,
    lines: u64,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Lines written so far, headers included.
    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// # Errors
    /// Returns [`ProbeError::Io`] if the writer fails
    pub fn write_header(&mut self, task: Task) -> Result<()> {
        self.line(header(task))
    }

    /// `<tableId>\t<count or error message>` per table.
    ///
    /// # Errors
    /// Returns [`ProbeError::Io`] if the writer fails
    pub fn write_counts(&mut self, result: &CountsResult) -> Result<()> {
        for (table, count) in &result.tables {
            self.line(&format!("{}\t{}", table, count.as_str()))?;
        }
        self.flush()
    }

    /// `<tableId>\t<line>` per description line.
    ///
    /// # Errors
    /// Returns [`ProbeError::Io`] if the writer fails
    pub fn write_descriptions(&mut self, result: &DescriptionsResult) -> Result<()> {
        for (table, description) in &result.tables {
            let text = description.as_str();
            if text.is_empty() {
                self.line(&format!("{}\t", table))?;
                continue;
            }
            for line in text.lines() {
                self.line(&format!("{}\t{}", table, line))?;
            }
        }
        self.flush()
    }

    /// `<tableId>\t<column>\t<row>\t<value>\t<count>` per bucket.
    ///
    /// `row` restarts at 1 for each column of a table. A failed column is
    /// printed as `<tableId>\t<column>\t0\t<error message>\t`.
    ///
    /// # Errors
    /// Returns [`ProbeError::Io`] if the writer fails
    pub fn write_histograms(&mut self, result: &HistogramsResult) -> Result<()> {
        for (table, entries) in &result.tables {
            let mut previous: Option<&str> = None;
            let mut row = 0u32;

            for entry in entries {
                if previous != Some(entry.column()) {
                    previous = Some(entry.column());
                    row = 0;
                }

                match entry {
                    HistogramEntry::Bucket(bucket) => {
                        row += 1;
                        self.line(&format!(
                            "{}\t{}\t{}\t{}\t{}",
                            table, bucket.column, row, bucket.value, bucket.count
                        ))?;
                    }
                    HistogramEntry::Failed { column, message } => {
                        self.line(&format!("{}\t{}\t0\t{}\t", table, column, message))?;
                    }
                }
            }
        }
        self.flush()
    }

    /// `<label>\t<count>\t` per matching column.
    ///
    /// # Errors
    /// Returns [`ProbeError::Io`] if the writer fails
    pub fn write_search(&mut self, result: &SearchResult) -> Result<()> {
        for row in &result.rows {
            let line: String = row
                .iter()
                .map(|(label, value)| format!("{}\t{}\t", label, value))
                .collect();
            self.line(&line)?;
        }
        self.flush()
    }

    /// # Errors
    /// Returns [`ProbeError::Io`] if the writer fails
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(write_failed)
    }

    fn line(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line).map_err(write_failed)?;
        self.lines += 1;
        Ok(())
    }
}

fn write_failed(source: std::io::Error) -> ProbeError {
    ProbeError::Io {
        context: "Failed to write report".to_string(),
        source,
    }
}
