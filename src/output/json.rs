//! JSON output for reconciliation reports.

use std::io::Write;

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;

use crate::diff::ReconciliationReport;
use crate::model::CellValue;

use super::ReportRenderer;

/// JSON rendering, pretty-printed by default.
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    columns: &'a [String],
    rows: Vec<JsonRow<'a>>,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    sample: &'a str,
    values: &'a IndexMap<String, CellValue>,
    diff: String,
}

impl ReportRenderer for JsonOutput {
    fn render(&self, report: &ReconciliationReport, writer: &mut dyn Write) -> Result<()> {
        let payload = JsonReport {
            columns: &report.columns,
            rows: report
                .rows
                .iter()
                .map(|row| JsonRow {
                    sample: &row.key,
                    values: &row.values,
                    diff: row.reason(),
                })
                .collect(),
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &payload)?;
        } else {
            serde_json::to_writer(&mut *writer, &payload)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}
