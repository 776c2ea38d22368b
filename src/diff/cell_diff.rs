//! Cell-level comparison logic.
//!
//! All kind-specific equality rules live here so that tolerance policy has
//! exactly one home. The comparator never decides record-level presence;
//! a cell that is missing on either side does not count as a difference.

use crate::config::DEFAULT_TOLERANCE;
use crate::error::{MetadiffError, Result};
use crate::model::{CellValue, ColumnKind, SERIES_LEN};

/// Kind-aware cell comparator with an absolute numeric tolerance.
#[derive(Debug, Clone, Copy)]
pub struct ValueComparator {
    tolerance: f64,
}

impl ValueComparator {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Decide whether two cells of the given kind differ.
    ///
    /// Numeric text that does not parse is a format error, never a silent
    /// "no difference".
    pub fn differs(&self, kind: ColumnKind, left: &CellValue, right: &CellValue) -> Result<bool> {
        // A flag cell is never missing, it defaults to false.
        if kind != ColumnKind::Flag && (left.is_missing() || right.is_missing()) {
            return Ok(false);
        }
        match kind {
            ColumnKind::PlainText => {
                Ok(normalize_text(&left.display()) != normalize_text(&right.display()))
            }
            ColumnKind::Numeric => {
                let (l, r) = (to_number(left)?, to_number(right)?);
                match (l, r) {
                    (Some(l), Some(r)) => Ok((l - r).abs() > self.tolerance),
                    _ => Ok(false),
                }
            }
            ColumnKind::NumericArray => {
                let (l, r) = (to_series(left), to_series(right));
                for position in 0..SERIES_LEN {
                    if let (Some(lv), Some(rv)) = (l[position], r[position]) {
                        if (lv - rv).abs() > self.tolerance {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
            ColumnKind::Flag => Ok(to_flag(left) != to_flag(right)),
        }
    }
}

impl Default for ValueComparator {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

/// Trim and collapse internal newlines to spaces.
fn normalize_text(raw: &str) -> String {
    raw.trim().replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Numeric view of a cell. Text is parsed on the fly so hand-built tables
/// behave like loaded ones; `None` is a parsed-but-unset value.
fn to_number(cell: &CellValue) -> Result<Option<f64>> {
    match cell {
        CellValue::Number(v) => Ok(Some(*v)),
        CellValue::Missing => Ok(None),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(v) if v.is_nan() => Ok(None),
                Ok(v) => Ok(Some(v)),
                Err(_) => Err(MetadiffError::Format {
                    value: s.clone(),
                    sample: None,
                    column: None,
                }),
            }
        }
        CellValue::Flag(_) | CellValue::Series(_) => Err(MetadiffError::Format {
            value: cell.display().into_owned(),
            sample: None,
            column: None,
        }),
    }
}

/// Series view of a cell; anything that is not a well-formed series is
/// all-missing.
fn to_series(cell: &CellValue) -> Vec<Option<f64>> {
    match cell {
        CellValue::Series(values) => {
            let mut values = values.clone();
            values.resize(SERIES_LEN, None);
            values
        }
        CellValue::Text(s) => match CellValue::parse(s, ColumnKind::NumericArray) {
            Ok(CellValue::Series(values)) => values,
            _ => vec![None; SERIES_LEN],
        },
        _ => vec![None; SERIES_LEN],
    }
}

/// Boolean view of a cell; absent means false.
fn to_flag(cell: &CellValue) -> bool {
    match cell {
        CellValue::Flag(b) => *b,
        CellValue::Text(s) => matches!(
            CellValue::parse(s, ColumnKind::Flag),
            Ok(CellValue::Flag(true))
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn series(raw: &str) -> CellValue {
        CellValue::parse(raw, ColumnKind::NumericArray).unwrap()
    }

    #[test]
    fn plain_text_trims_but_keeps_case() {
        let cmp = ValueComparator::default();
        // trailing whitespace is normalized away...
        assert!(!cmp
            .differs(ColumnKind::PlainText, &text("Germany"), &text("Germany "))
            .unwrap());
        // ...but case still counts
        assert!(cmp
            .differs(ColumnKind::PlainText, &text("Germany"), &text("germany "))
            .unwrap());
    }

    #[test]
    fn plain_text_normalizes_internal_newlines() {
        let cmp = ValueComparator::default();
        assert!(!cmp
            .differs(
                ColumnKind::PlainText,
                &text("forest\nclearing"),
                &text("forest clearing")
            )
            .unwrap());
    }

    #[test]
    fn missing_on_either_side_never_differs() {
        let cmp = ValueComparator::default();
        for kind in [
            ColumnKind::PlainText,
            ColumnKind::Numeric,
            ColumnKind::NumericArray,
        ] {
            assert!(!cmp
                .differs(kind, &CellValue::Missing, &text("1.0"))
                .unwrap());
            assert!(!cmp
                .differs(kind, &text("1.0"), &CellValue::Missing)
                .unwrap());
        }
    }

    #[test]
    fn numeric_tolerance_boundary() {
        let tolerance = 1e-3;
        let cmp = ValueComparator::new(tolerance);
        let base = CellValue::Number(100.0);
        let inside = CellValue::Number(100.0 + tolerance * 0.99);
        let outside = CellValue::Number(100.0 + tolerance * 1.01);
        assert!(!cmp.differs(ColumnKind::Numeric, &base, &inside).unwrap());
        assert!(cmp.differs(ColumnKind::Numeric, &base, &outside).unwrap());
    }

    #[test]
    fn numeric_garbage_is_a_format_error() {
        let cmp = ValueComparator::default();
        let err = cmp
            .differs(ColumnKind::Numeric, &text("12 m"), &CellValue::Number(12.0))
            .unwrap_err();
        assert!(matches!(err, MetadiffError::Format { .. }));
    }

    #[test]
    fn series_skips_positions_missing_on_one_side() {
        let cmp = ValueComparator::default();
        assert!(!cmp
            .differs(ColumnKind::NumericArray, &series("1,2,,4"), &series("1,2,3,4"))
            .unwrap());
        assert!(cmp
            .differs(ColumnKind::NumericArray, &series("1,2,3,4"), &series("1,2,9,4"))
            .unwrap());
    }

    #[test]
    fn series_respects_tolerance() {
        let cmp = ValueComparator::new(0.5);
        assert!(!cmp
            .differs(ColumnKind::NumericArray, &series("1.0,2.0"), &series("1.4,2.0"))
            .unwrap());
        assert!(cmp
            .differs(ColumnKind::NumericArray, &series("1.0,2.0"), &series("1.6,2.0"))
            .unwrap());
    }

    #[test]
    fn flags_compare_as_booleans() {
        let cmp = ValueComparator::default();
        assert!(cmp
            .differs(ColumnKind::Flag, &CellValue::Flag(true), &CellValue::Flag(false))
            .unwrap());
        assert!(!cmp
            .differs(ColumnKind::Flag, &text("true"), &text("T"))
            .unwrap());
        // absent defaults to false
        assert!(cmp
            .differs(ColumnKind::Flag, &CellValue::Missing, &CellValue::Flag(true))
            .unwrap());
        assert!(!cmp
            .differs(ColumnKind::Flag, &CellValue::Missing, &CellValue::Flag(false))
            .unwrap());
    }
}
