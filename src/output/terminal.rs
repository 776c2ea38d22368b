//! Terminal output for reconciliation reports.

use std::io::Write;

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::diff::ReconciliationReport;
use crate::model::KEY_COLUMN;

use super::{ReportRenderer, DIFF_COLUMN};

/// Human-readable table with a summary line.
pub struct TerminalOutput {
    color_choice: ColorChoice,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            color_choice: ColorChoice::Auto,
        }
    }

    pub fn with_color_choice(color_choice: ColorChoice) -> Self {
        Self { color_choice }
    }

    /// Render to stdout with a colored summary line.
    pub fn render_colored(&self, report: &ReconciliationReport) -> Result<()> {
        let mut stdout = StandardStream::stdout(self.color_choice);
        let mut spec = ColorSpec::new();
        if report.is_empty() {
            spec.set_fg(Some(Color::Green));
            stdout.set_color(&spec)?;
            writeln!(stdout, "No differences")?;
            stdout.reset()?;
            return Ok(());
        }
        spec.set_fg(Some(Color::Yellow)).set_bold(true);
        stdout.set_color(&spec)?;
        writeln!(stdout, "{} record(s) differ", report.len())?;
        stdout.reset()?;
        writeln!(stdout)?;
        self.write_table(report, &mut stdout)?;
        Ok(())
    }

    fn write_table(&self, report: &ReconciliationReport, writer: &mut dyn Write) -> Result<()> {
        let mut builder = Builder::default();
        let mut header = vec![KEY_COLUMN.to_string()];
        header.extend(report.columns.iter().cloned());
        header.push(DIFF_COLUMN.to_string());
        builder.push_record(header);

        for row in &report.rows {
            let mut cells = vec![row.key.clone()];
            cells.extend(row.values.values().map(|v| v.display().into_owned()));
            cells.push(row.reason());
            builder.push_record(cells);
        }

        let table = builder.build().with(Style::sharp()).to_string();
        writeln!(writer, "{table}")?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer for TerminalOutput {
    fn render(&self, report: &ReconciliationReport, writer: &mut dyn Write) -> Result<()> {
        if report.is_empty() {
            writeln!(writer, "No differences")?;
            return Ok(());
        }
        writeln!(writer, "{} record(s) differ", report.len())?;
        writeln!(writer)?;
        self.write_table(report, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileOptions;
    use crate::diff::reconcile;
    use crate::model::{KindRegistry, Table};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn report() -> ReconciliationReport {
        let left = Table::load(
            &strings(&["SampleName", "Country"]),
            vec![strings(&["s1", "Germany"])],
            &KindRegistry::default(),
        )
        .unwrap();
        let right = Table::load(
            &strings(&["SampleName", "Country"]),
            vec![strings(&["s1", "Poland"])],
            &KindRegistry::default(),
        )
        .unwrap();
        reconcile(&left, &right, &ReconcileOptions::default()).unwrap()
    }

    #[test]
    fn renders_key_values_and_reasons() {
        let mut buffer = Vec::new();
        TerminalOutput::new().render(&report(), &mut buffer).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("1 record(s) differ"));
        assert!(output.contains("s1"));
        assert!(output.contains("Germany"));
        assert!(output.contains("Country,"));
    }

    #[test]
    fn empty_report_renders_a_single_line() {
        let mut buffer = Vec::new();
        TerminalOutput::new()
            .render(&ReconciliationReport::default(), &mut buffer)
            .unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "No differences\n");
    }
}
