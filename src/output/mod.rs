//! Rendering of reconciliation reports.

mod json;
mod markdown;
mod terminal;
mod tsv;

use std::io::Write;

use anyhow::Result;

use crate::diff::ReconciliationReport;

pub use json::JsonOutput;
pub use markdown::MarkdownOutput;
pub use terminal::TerminalOutput;
pub use tsv::TsvOutput;

/// Synthetic column carrying the packed diff reasons.
pub const DIFF_COLUMN: &str = "diff";

/// Output format for reconciliation reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Tsv,
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "tsv" => Ok(OutputFormat::Tsv),
            "markdown" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

/// Trait for report renderers.
pub trait ReportRenderer {
    /// Render the report to a writer.
    fn render(&self, report: &ReconciliationReport, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating renderers based on format.
pub struct OutputFactory;

impl OutputFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ReportRenderer> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new()),
            OutputFormat::Tsv => Box::new(TsvOutput),
            OutputFormat::Markdown => Box::new(MarkdownOutput::default()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render a report to stdout. The terminal renderer colors its summary
/// line when stdout is a tty.
pub fn render_to_stdout(report: &ReconciliationReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Terminal {
        return TerminalOutput::new().render_colored(report);
    }
    let renderer = OutputFactory::create(format);
    let mut stdout = std::io::stdout();
    renderer.render(report, &mut stdout)
}
