//! Table, Record, and CellValue data structures.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{MetadiffError, Result};

use super::exception::ExceptionSet;
use super::kind::{ColumnKind, KindRegistry, SERIES_LEN};

/// Name of the sample key column in the flat meta format.
pub const KEY_COLUMN: &str = "SampleName";

/// Name of the packed exception-set column in the flat meta format.
pub const OKEXCEPT_COLUMN: &str = "okexcept";

/// A cell value, typed according to its column kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Absent value. Distinct from an empty string and from zero/false.
    Missing,
    Text(String),
    Number(f64),
    /// Fixed-length climate series; unset positions are `None`.
    Series(Vec<Option<f64>>),
    Flag(bool),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Missing, CellValue::Missing) => true,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => {
                // NaN never survives parsing, but table equality in tests
                // must not be poisoned by it either.
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::Series(a), CellValue::Series(b)) => a == b,
            (CellValue::Flag(a), CellValue::Flag(b)) => a == b,
            _ => false,
        }
    }
}

impl CellValue {
    /// Parse a raw string according to the column kind.
    ///
    /// Numeric cells are missing iff the raw value is empty; any other
    /// unparsable value is a format error. Series cells degrade to
    /// all-missing on ragged or malformed input. Flag cells default to
    /// false when absent.
    pub fn parse(raw: &str, kind: ColumnKind) -> Result<Self> {
        match kind {
            ColumnKind::PlainText => {
                if raw.is_empty() {
                    Ok(CellValue::Missing)
                } else {
                    Ok(CellValue::Text(raw.to_string()))
                }
            }
            ColumnKind::Numeric => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(CellValue::Missing);
                }
                match trimmed.parse::<f64>() {
                    Ok(value) if value.is_nan() => Ok(CellValue::Missing),
                    Ok(value) => Ok(CellValue::Number(value)),
                    Err(_) => Err(MetadiffError::Format {
                        value: raw.to_string(),
                        sample: None,
                        column: None,
                    }),
                }
            }
            ColumnKind::NumericArray => Ok(CellValue::Series(parse_series(raw))),
            ColumnKind::Flag => Ok(CellValue::Flag(parse_flag(raw))),
        }
    }

    /// Check if the value is missing.
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Serialized form, as written to the flat meta format. Floats carry
    /// up to 8 significant digits.
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Missing => Cow::Borrowed(""),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
            CellValue::Number(v) => Cow::Owned(format_sig(*v, 8)),
            CellValue::Series(values) => {
                let parts: Vec<String> = values
                    .iter()
                    .map(|v| v.map(|f| format_sig(f, 8)).unwrap_or_default())
                    .collect();
                Cow::Owned(parts.join(","))
            }
            CellValue::Flag(b) => Cow::Borrowed(if *b { "True" } else { "False" }),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Number(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Flag(b)
    }
}

/// Parse a comma-delimited climate series. Ragged or otherwise malformed
/// input degrades to an all-missing series instead of failing the load;
/// a corrupt series surfaces downstream as a validation failure, not as
/// an aborted reconciliation.
fn parse_series(raw: &str) -> Vec<Option<f64>> {
    if raw.trim().is_empty() {
        return vec![None; SERIES_LEN];
    }
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() > SERIES_LEN {
        return vec![None; SERIES_LEN];
    }
    let mut values = Vec::with_capacity(SERIES_LEN);
    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            values.push(None);
            continue;
        }
        match part.parse::<f64>() {
            Ok(v) if v.is_nan() => values.push(None),
            Ok(v) => values.push(Some(v)),
            Err(_) => return vec![None; SERIES_LEN],
        }
    }
    values.resize(SERIES_LEN, None);
    values
}

/// Normalize a boolean-like string. `t…`, `y…` and `1` prefixes count as
/// true regardless of case; everything else, including absent, is false.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().chars().next(),
        Some('t' | 'T' | 'y' | 'Y' | '1')
    )
}

/// Format a float with up to `digits` significant digits, trimming
/// trailing zeros, like `%.8g`.
pub fn format_sig(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let digits = digits.max(1);
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= digits as i32 {
        let formatted = format!("{:.*e}", digits - 1, value);
        match formatted.split_once('e') {
            Some((mantissa, exp)) => {
                let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
                format!("{mantissa}e{exp}")
            }
            None => formatted,
        }
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        let formatted = format!("{:.*}", decimals, value);
        if formatted.contains('.') {
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string()
        } else {
            formatted
        }
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Plain-text column.
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::PlainText)
    }
}

/// One sample: key, cells aligned to the table's columns, and the set of
/// tolerated failing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub cells: Vec<CellValue>,
    pub accepted: ExceptionSet,
}

impl Record {
    pub fn new(key: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            key: key.into(),
            cells,
            accepted: ExceptionSet::new(),
        }
    }

    /// Get a cell by column index.
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// An ordered collection of records keyed by sample name.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    records: Vec<Record>,
    index: IndexMap<String, usize>,
}

impl Table {
    /// Create an empty table with column definitions.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            records: Vec::new(),
            index: IndexMap::new(),
        }
    }

    /// Build a table from a header and raw string rows.
    ///
    /// The header must contain the `SampleName` column; an `okexcept`
    /// column, when present, unpacks into each record's exception set.
    /// Remaining cells are typed per the registry. Duplicate or empty
    /// sample keys fail the load.
    pub fn load<I, R>(header: &[String], rows: I, registry: &KindRegistry) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[String]>,
    {
        let key_pos = header
            .iter()
            .position(|name| name == KEY_COLUMN)
            .ok_or_else(|| {
                MetadiffError::Schema(format!("missing required column '{KEY_COLUMN}'"))
            })?;
        let okexcept_pos = header.iter().position(|name| name == OKEXCEPT_COLUMN);

        let columns: Vec<Column> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != key_pos && Some(*i) != okexcept_pos)
            .map(|(_, name)| Column::new(name.clone(), registry.kind_of(name)))
            .collect();

        let mut table = Table::new(columns);
        for row in rows {
            let row = row.as_ref();
            let key = row.get(key_pos).map(String::as_str).unwrap_or("");
            let mut cells = Vec::with_capacity(table.columns.len());
            let mut column_cursor = 0;
            for i in 0..header.len() {
                if i == key_pos || Some(i) == okexcept_pos {
                    continue;
                }
                let raw = row.get(i).map(String::as_str).unwrap_or("");
                let column = &table.columns[column_cursor];
                let cell = CellValue::parse(raw, column.kind)
                    .map_err(|e| e.with_location(key, &column.name))?;
                cells.push(cell);
                column_cursor += 1;
            }
            let mut record = Record::new(key, cells);
            if let Some(pos) = okexcept_pos {
                let raw = row.get(pos).map(String::as_str).unwrap_or("");
                record.accepted = ExceptionSet::unpack(raw);
            }
            table.push(record)?;
        }
        Ok(table)
    }

    /// Append a record, enforcing key uniqueness. Short rows are padded
    /// with missing values.
    pub fn push(&mut self, mut record: Record) -> Result<()> {
        if record.key.is_empty() {
            return Err(MetadiffError::Schema(format!(
                "empty {KEY_COLUMN} in row {}",
                self.records.len() + 1
            )));
        }
        if self.index.contains_key(&record.key) {
            return Err(MetadiffError::Schema(format!(
                "duplicate {KEY_COLUMN} {:?}",
                record.key
            )));
        }
        if record.cells.len() > self.columns.len() {
            return Err(MetadiffError::Schema(format!(
                "sample {:?} has {} cells but the table declares {} columns",
                record.key,
                record.cells.len(),
                self.columns.len()
            )));
        }
        record.cells.resize(self.columns.len(), CellValue::Missing);
        self.index.insert(record.key.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Get a record by sample key.
    pub fn get(&self, key: &str) -> Result<&Record> {
        self.index
            .get(key)
            .map(|&idx| &self.records[idx])
            .ok_or_else(|| MetadiffError::MissingKey(key.to_string()))
    }

    /// Mutable access to a record by sample key.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut Record> {
        match self.index.get(key) {
            Some(&idx) => Ok(&mut self.records[idx]),
            None => Err(MetadiffError::MissingKey(key.to_string())),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Sample keys in table order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.key.as_str())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Get column index by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Kind of the named column, `PlainText` for unknown names.
    pub fn column_kind(&self, name: &str) -> ColumnKind {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
            .unwrap_or_default()
    }

    /// Cell for a sample and column, if both exist.
    pub fn cell(&self, key: &str, column: &str) -> Option<&CellValue> {
        let record = self.get(key).ok()?;
        let idx = self.column_index(column)?;
        record.get(idx)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
