//! Reconciliation engine for two versions of the metadata table.

pub mod cell_diff;
mod join;

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::config::{Projection, ReconcileOptions};
use crate::error::{MetadiffError, Result};
use crate::model::{CellValue, ExceptionSet, Record, Table};

pub use cell_diff::ValueComparator;
pub use join::{join, JoinedRecord};

/// Suffix disambiguating right-sourced columns in `both`-style projections.
pub const RIGHT_SUFFIX: &str = "_r";

/// Diff reason for a record absent from the left table.
pub const MISSING_IN_LEFT: &str = "missing in left";

/// Diff reason for a record absent from the right table.
pub const MISSING_IN_RIGHT: &str = "missing in right";

/// One reported sample: projected values plus the reasons it differs.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDiff {
    pub key: String,
    /// Projected column values in report column order.
    pub values: IndexMap<String, CellValue>,
    /// Differing column names and/or missing-side sentinels.
    pub reasons: ExceptionSet,
}

impl RecordDiff {
    /// Packed reason string, same convention as the exception sets.
    pub fn reason(&self) -> String {
        self.reasons.pack()
    }
}

/// Result of reconciling two tables. An empty report means the tables
/// agree under the given options; that is an expected terminal state.
#[derive(Debug, Default)]
pub struct ReconciliationReport {
    /// Projected column names in output order (the synthetic `diff`
    /// column is appended by renderers).
    pub columns: Vec<String>,
    pub rows: Vec<RecordDiff>,
}

impl ReconciliationReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Union of differing column names across the report, sentinels
    /// excluded.
    pub fn diffed_columns(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .flat_map(|row| row.reasons.iter())
            .filter(|reason| *reason != MISSING_IN_LEFT && *reason != MISSING_IN_RIGHT)
            .map(str::to_string)
            .collect()
    }
}

/// Which table a projected column reads from.
#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Reconciliation engine: joins two tables and reports field-level
/// differences. Never mutates its inputs.
pub struct ReconcileEngine {
    options: ReconcileOptions,
    comparator: ValueComparator,
}

impl ReconcileEngine {
    pub fn new(options: ReconcileOptions) -> Self {
        let comparator = ValueComparator::new(options.tolerance);
        Self {
            options,
            comparator,
        }
    }

    /// Compare two tables and build the reconciliation report.
    pub fn reconcile(&self, left: &Table, right: &Table) -> Result<ReconciliationReport> {
        let compare = self.compare_columns(left, right)?;
        let joined = join(left, right, self.options.join_mode);

        let mut diffed = Vec::new();
        for record in joined {
            let mut reasons = ExceptionSet::new();
            if record.left.is_none() {
                reasons.insert(MISSING_IN_LEFT);
            }
            if record.right.is_none() {
                reasons.insert(MISSING_IN_RIGHT);
            }
            // a record absent on one side cannot be field-diffed
            if record.is_complete() {
                for column in &compare {
                    let kind = if left.column_index(column).is_some() {
                        left.column_kind(column)
                    } else {
                        right.column_kind(column)
                    };
                    let left_cell = side_cell(left, record.left, column);
                    let right_cell = side_cell(right, record.right, column);
                    let differs = self
                        .comparator
                        .differs(kind, left_cell, right_cell)
                        .map_err(|e| e.with_location(record.key, column))?;
                    if differs {
                        reasons.insert(column.clone());
                    }
                }
            }
            if !reasons.is_empty() {
                diffed.push((record, reasons));
            }
        }

        let changed: BTreeSet<String> = diffed
            .iter()
            .flat_map(|(_, reasons)| reasons.iter())
            .filter(|reason| *reason != MISSING_IN_LEFT && *reason != MISSING_IN_RIGHT)
            .map(str::to_string)
            .collect();
        let projected = self.projected_columns(left, right, &changed);

        let rows = diffed
            .into_iter()
            .map(|(record, reasons)| RecordDiff {
                key: record.key.to_string(),
                values: projected
                    .iter()
                    .map(|(name, side, source)| {
                        let (table, side_record) = match side {
                            Side::Left => (left, record.left),
                            Side::Right => (right, record.right),
                        };
                        let value = side_cell(table, side_record, source).clone();
                        (name.clone(), value)
                    })
                    .collect(),
                reasons,
            })
            .collect();

        Ok(ReconciliationReport {
            columns: projected.into_iter().map(|(name, _, _)| name).collect(),
            rows,
        })
    }

    /// Columns to compare: the explicit list, or the intersection of both
    /// tables' columns, minus excludes.
    fn compare_columns(&self, left: &Table, right: &Table) -> Result<Vec<String>> {
        let columns: Vec<String> = match &self.options.compare_columns {
            Some(explicit) => {
                for column in explicit {
                    if left.column_index(column).is_none() && right.column_index(column).is_none() {
                        return Err(MetadiffError::Schema(format!(
                            "compare column '{column}' exists in neither table"
                        )));
                    }
                }
                explicit.clone()
            }
            None => left
                .column_names()
                .filter(|name| right.column_index(name).is_some())
                .map(str::to_string)
                .collect(),
        };
        Ok(columns
            .into_iter()
            .filter(|name| !self.options.exclude_columns.iter().any(|e| e == name))
            .collect())
    }

    /// Output columns as (name, source side, source column), ordered by
    /// the primary reference side; right-sourced columns are renamed back
    /// to their plain names unless both sides project.
    fn projected_columns(
        &self,
        left: &Table,
        right: &Table,
        changed: &BTreeSet<String>,
    ) -> Vec<(String, Side, String)> {
        match self.options.projection {
            Projection::LeftDiff => left
                .column_names()
                .filter(|name| changed.contains(*name))
                .map(|name| (name.to_string(), Side::Left, name.to_string()))
                .collect(),
            Projection::RightDiff => right
                .column_names()
                .filter(|name| changed.contains(*name))
                .map(|name| (name.to_string(), Side::Right, name.to_string()))
                .collect(),
            Projection::BothDiff => left
                .column_names()
                .filter(|name| changed.contains(*name))
                .flat_map(|name| {
                    [
                        (name.to_string(), Side::Left, name.to_string()),
                        (format!("{name}{RIGHT_SUFFIX}"), Side::Right, name.to_string()),
                    ]
                })
                .collect(),
            Projection::Left => left
                .column_names()
                .map(|name| (name.to_string(), Side::Left, name.to_string()))
                .collect(),
            Projection::Right => right
                .column_names()
                .map(|name| (name.to_string(), Side::Right, name.to_string()))
                .collect(),
            Projection::Both => {
                let mut columns: Vec<(String, Side, String)> = left
                    .column_names()
                    .map(|name| (name.to_string(), Side::Left, name.to_string()))
                    .collect();
                for name in right.column_names() {
                    let output = if left.column_index(name).is_some() {
                        format!("{name}{RIGHT_SUFFIX}")
                    } else {
                        name.to_string()
                    };
                    columns.push((output, Side::Right, name.to_string()));
                }
                columns
            }
            Projection::Inner => left
                .column_names()
                .filter(|name| right.column_index(name).is_some())
                .map(|name| (name.to_string(), Side::Left, name.to_string()))
                .collect(),
        }
    }
}

static MISSING: CellValue = CellValue::Missing;

/// Cell for a possibly-absent record; absent records and unknown columns
/// read as missing.
fn side_cell<'a>(table: &'a Table, record: Option<&'a Record>, column: &str) -> &'a CellValue {
    record
        .and_then(|r| table.column_index(column).and_then(|idx| r.get(idx)))
        .unwrap_or(&MISSING)
}

/// Convenience wrapper constructing the engine for a single run.
pub fn reconcile(
    left: &Table,
    right: &Table,
    options: &ReconcileOptions,
) -> Result<ReconciliationReport> {
    ReconcileEngine::new(options.clone()).reconcile(left, right)
}
