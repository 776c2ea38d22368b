//! Markdown pipe-table output, as posted in review comments.

use std::io::Write;

use anyhow::Result;

use crate::diff::ReconciliationReport;
use crate::model::KEY_COLUMN;

use super::{ReportRenderer, DIFF_COLUMN};

/// Markdown rendering with a leading separator row and a row cap, the
/// shape review front ends expect.
pub struct MarkdownOutput {
    max_rows: usize,
}

impl Default for MarkdownOutput {
    fn default() -> Self {
        Self { max_rows: 200 }
    }
}

impl MarkdownOutput {
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self { max_rows }
    }
}

impl ReportRenderer for MarkdownOutput {
    fn render(&self, report: &ReconciliationReport, writer: &mut dyn Write) -> Result<()> {
        let mut header = vec![KEY_COLUMN.to_string()];
        header.extend(report.columns.iter().cloned());
        header.push(DIFF_COLUMN.to_string());

        writeln!(writer, "| {} |", header.join(" | "))?;
        writeln!(
            writer,
            "| {} |",
            header.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
        )?;

        for row in report.rows.iter().take(self.max_rows) {
            let mut cells = vec![row.key.clone()];
            cells.extend(row.values.values().map(|v| v.display().into_owned()));
            cells.push(row.reason());
            writeln!(writer, "| {} |", cells.join(" | "))?;
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "Displaying {} of {} rows",
            report.len().min(self.max_rows),
            report.len()
        )?;
        Ok(())
    }
}
