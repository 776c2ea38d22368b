//! Tab-delimited output for reconciliation reports, suitable for saving
//! alongside the metadata (the original workflow stored diffs under
//! `queries/`).

use std::io::Write;

use anyhow::Result;

use crate::diff::ReconciliationReport;
use crate::model::KEY_COLUMN;

use super::{ReportRenderer, DIFF_COLUMN};

/// Machine-readable TSV rendering.
pub struct TsvOutput;

impl ReportRenderer for TsvOutput {
    fn render(&self, report: &ReconciliationReport, writer: &mut dyn Write) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);

        let mut header = vec![KEY_COLUMN.to_string()];
        header.extend(report.columns.iter().cloned());
        header.push(DIFF_COLUMN.to_string());
        csv_writer.write_record(&header)?;

        for row in &report.rows {
            let mut cells = vec![row.key.clone()];
            cells.extend(row.values.values().map(|v| v.display().into_owned()));
            cells.push(row.reason());
            csv_writer.write_record(&cells)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JoinMode, ReconcileOptions};
    use crate::diff::reconcile;
    use crate::model::{KindRegistry, Table};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn writes_header_rows_and_diff_column() {
        let left = Table::load(
            &strings(&["SampleName", "Elevation"]),
            vec![strings(&["s1", "10"]), strings(&["s2", "20"])],
            &KindRegistry::default(),
        )
        .unwrap();
        let right = Table::load(
            &strings(&["SampleName", "Elevation"]),
            vec![strings(&["s1", "15"])],
            &KindRegistry::default(),
        )
        .unwrap();
        let report = reconcile(
            &left,
            &right,
            &ReconcileOptions::default().with_join_mode(JoinMode::Left),
        )
        .unwrap();

        let mut buffer = Vec::new();
        TsvOutput.render(&report, &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("SampleName\tElevation\tdiff"));
        assert_eq!(lines.next(), Some("s1\t10\tElevation,"));
        assert_eq!(lines.next(), Some("s2\t20\tmissing in right,"));
    }
}
