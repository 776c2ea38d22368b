//! metadiff - Reconciliation engine for curated sample metadata

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use metadiff::config::{JoinMode, Projection, ReconcileOptions, DEFAULT_TOLERANCE};
use metadiff::diff::reconcile;
use metadiff::output::{render_to_stdout, OutputFactory, OutputFormat};
use metadiff::overlay::{accept, unaccept, FieldSelector, OverlayOutcome};
use metadiff::parser::{read_meta, write_meta};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Tsv,
    Markdown,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Tsv => OutputFormat::Tsv,
            CliOutputFormat::Markdown => OutputFormat::Markdown,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Reconciliation engine for curated sample metadata
#[derive(Parser, Debug)]
#[command(name = "metadiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compare two versions of a metadata file
    Diff {
        /// Left/incoming metadata file
        left: PathBuf,

        /// Right/reference metadata file
        right: PathBuf,

        /// Join mode: inner, outer, left or right
        #[arg(long, default_value = "inner")]
        how: String,

        /// Column(s) to compare (comma-separated); defaults to the
        /// intersection of both files' columns
        #[arg(long, value_delimiter = ',')]
        on: Vec<String>,

        /// Column(s) to exclude from the comparison (comma-separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Absolute tolerance for numeric comparisons
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,

        /// Report columns: leftdiff, rightdiff, bothdiff, left, right,
        /// both or inner
        #[arg(long, default_value = "leftdiff")]
        columns: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: CliOutputFormat,

        /// Write the report to a file instead of stdout (TSV unless
        /// --format says otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mark failing fields as accepted for the selected samples
    Accept {
        /// Metadata file to update in place
        meta: PathBuf,

        /// Selectors of the form sample:column; sample may be 'all'
        #[arg(required = true)]
        selectors: Vec<String>,

        /// Match sample names exactly instead of by regex substring
        #[arg(long)]
        exact: bool,

        /// Report missing samples instead of failing
        #[arg(long)]
        no_raise: bool,
    },

    /// Reverse acceptance for the selected samples
    Unaccept {
        /// Metadata file to update in place
        meta: PathBuf,

        /// Selectors of the form sample:column; both parts may be 'all'
        #[arg(required = true)]
        selectors: Vec<String>,

        /// Match sample names exactly instead of by regex substring
        #[arg(long)]
        exact: bool,

        /// Report missing samples instead of failing
        #[arg(long)]
        no_raise: bool,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(has_changes) => {
            if has_changes {
                ExitCode::from(1) // Differences found
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    match cli.command {
        Command::Diff {
            left,
            right,
            how,
            on,
            exclude,
            tolerance,
            columns,
            format,
            output,
        } => {
            let join_mode: JoinMode = how.parse().map_err(anyhow::Error::msg)?;
            let projection: Projection = columns.parse().map_err(anyhow::Error::msg)?;

            let mut options = ReconcileOptions::new()
                .with_join_mode(join_mode)
                .with_exclude_columns(exclude)
                .with_tolerance(tolerance)
                .with_projection(projection);
            if !on.is_empty() {
                options = options.with_compare_columns(on);
            }

            let left_table = read_meta(&left)
                .with_context(|| format!("Failed to read left file: {}", left.display()))?;
            let right_table = read_meta(&right)
                .with_context(|| format!("Failed to read right file: {}", right.display()))?;

            let report = reconcile(&left_table, &right_table, &options)?;

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let mut writer = BufWriter::new(file);
                    let file_format = match format {
                        // terminal tables make no sense in a file
                        CliOutputFormat::Terminal => OutputFormat::Tsv,
                        other => other.into(),
                    };
                    OutputFactory::create(file_format).render(&report, &mut writer)?;
                }
                None => render_to_stdout(&report, format.into())?,
            }

            Ok(!report.is_empty())
        }

        Command::Accept {
            meta,
            selectors,
            exact,
            no_raise,
        } => {
            let mut table = read_meta(&meta)
                .with_context(|| format!("Failed to read {}", meta.display()))?;
            let selectors = parse_selectors(&selectors, exact)?;
            let outcome = accept(&mut table, &selectors, !no_raise)?;
            finish_overlay(&table, &meta, outcome)?;
            Ok(false)
        }

        Command::Unaccept {
            meta,
            selectors,
            exact,
            no_raise,
        } => {
            let mut table = read_meta(&meta)
                .with_context(|| format!("Failed to read {}", meta.display()))?;
            let selectors = parse_selectors(&selectors, exact)?;
            let outcome = unaccept(&mut table, &selectors, !no_raise)?;
            finish_overlay(&table, &meta, outcome)?;
            Ok(false)
        }
    }
}

fn parse_selectors(raw: &[String], exact: bool) -> Result<Vec<FieldSelector>> {
    raw.iter()
        .map(|s| FieldSelector::parse(s, exact).map_err(anyhow::Error::from))
        .collect()
}

/// Persist the overlay result and report what happened.
fn finish_overlay(table: &metadiff::Table, meta: &Path, outcome: OverlayOutcome) -> Result<()> {
    match outcome {
        OverlayOutcome::Applied { messages, samples } => {
            write_meta(table, meta)
                .with_context(|| format!("Failed to write {}", meta.display()))?;
            for message in &messages {
                println!("{message}");
            }
            println!("{samples} sample(s) affected");
        }
        OverlayOutcome::MissingSamples { message } => {
            println!("{message}");
        }
    }
    Ok(())
}
