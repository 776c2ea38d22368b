//! Exception overlay: curator-driven acceptance of failing fields.
//!
//! Accepting `(sample, column)` marks that field's validation failures as
//! tolerated by unioning the column name into the sample's exception set;
//! unaccepting removes it again. Both operations are plain set algebra:
//! accepting twice is a no-op, independent accepts commute, and every
//! selector is resolved and validated before the first mutation, so a
//! failed call never leaves a half-applied overlay.

mod selector;

use rustc_hash::FxHashSet;

use crate::error::{MetadiffError, Result};
use crate::model::Table;

pub use selector::{FieldSelector, SampleSelector, ALL};

/// What an overlay operation did, including the per-selector messages the
/// caller may use for commit logs.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOutcome {
    Applied {
        messages: Vec<String>,
        /// Number of distinct samples touched.
        samples: usize,
    },
    /// Soft-mode selection failure; the table is untouched.
    MissingSamples { message: String },
}

impl OverlayOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, OverlayOutcome::Applied { .. })
    }
}

/// Mark columns as accepted for the selected samples.
///
/// With `raise_error` a selection failure is an error; otherwise it is
/// reported through [`OverlayOutcome::MissingSamples`].
pub fn accept(
    table: &mut Table,
    selectors: &[FieldSelector],
    raise_error: bool,
) -> Result<OverlayOutcome> {
    if let Some(message) = missing_samples(table, selectors) {
        return soft_failure(message, raise_error);
    }

    let mut messages = Vec::new();
    let mut touched: FxHashSet<String> = FxHashSet::default();
    for selector in selectors {
        let keys: Vec<String> = selector
            .sample
            .resolve(table)
            .into_iter()
            .map(str::to_string)
            .collect();
        for key in &keys {
            table.get_mut(key)?.accepted.insert(selector.column.clone());
            touched.insert(key.clone());
        }
        messages.push(if selector.sample.is_all() {
            format!("Accept wrong {} for all samples", selector.column)
        } else {
            format!(
                "Accept wrong {} for sample {}",
                selector.column,
                selector.sample.pattern()
            )
        });
    }
    Ok(OverlayOutcome::Applied {
        messages,
        samples: touched.len(),
    })
}

/// Reverse acceptance for the selected samples. The column part of a
/// selector may be `all` to clear whole exception sets; `all:all` resets
/// the entire table.
pub fn unaccept(
    table: &mut Table,
    selectors: &[FieldSelector],
    raise_error: bool,
) -> Result<OverlayOutcome> {
    if let Some(message) = missing_samples(table, selectors) {
        return soft_failure(message, raise_error);
    }
    // nothing is accepted anywhere: a safe no-op
    if table.records().iter().all(|r| r.accepted.is_empty()) {
        return Ok(OverlayOutcome::Applied {
            messages: Vec::new(),
            samples: 0,
        });
    }

    let mut messages = Vec::new();
    let mut touched: FxHashSet<String> = FxHashSet::default();
    for selector in selectors {
        let keys: Vec<String> = selector
            .sample
            .resolve(table)
            .into_iter()
            .map(str::to_string)
            .collect();
        let clear_whole_set = selector.column == ALL;
        for key in &keys {
            let record = table.get_mut(key)?;
            if clear_whole_set {
                record.accepted.clear();
            } else {
                record.accepted.remove(&selector.column);
            }
            touched.insert(key.clone());
        }
        messages.push(match (selector.sample.is_all(), clear_whole_set) {
            (true, true) => "Do not accept any failure".to_string(),
            (true, false) => format!(
                "Do not accept wrong {} for all samples",
                selector.column
            ),
            (false, true) => format!(
                "Do not accept any failure for sample {}",
                selector.sample.pattern()
            ),
            (false, false) => format!(
                "Do not accept wrong {} for sample {}",
                selector.column,
                selector.sample.pattern()
            ),
        });
    }
    Ok(OverlayOutcome::Applied {
        messages,
        samples: touched.len(),
    })
}

/// Query-driven accept: the caller's predicate evaluator has already
/// resolved the matching sample keys.
pub fn accept_query(
    table: &mut Table,
    keys: &[String],
    columns: &[String],
    query: &str,
    raise_error: bool,
) -> Result<OverlayOutcome> {
    if keys.is_empty() {
        return soft_failure(format!("No samples selected with {query:?}"), raise_error);
    }
    let mut messages = Vec::new();
    for column in columns {
        for key in keys {
            table.get_mut(key)?.accepted.insert(column.clone());
        }
        messages.push(format!(
            "Accept wrong {column} for {} samples\n\nbased on '{query}'",
            keys.len()
        ));
    }
    Ok(OverlayOutcome::Applied {
        messages,
        samples: keys.len(),
    })
}

/// Query-driven unaccept, symmetric to [`accept_query`].
pub fn unaccept_query(
    table: &mut Table,
    keys: &[String],
    columns: &[String],
    query: &str,
    raise_error: bool,
) -> Result<OverlayOutcome> {
    if keys.is_empty() {
        return soft_failure(format!("No samples selected with {query:?}"), raise_error);
    }
    let mut messages = Vec::new();
    for column in columns {
        for key in keys {
            let record = table.get_mut(key)?;
            if column == ALL {
                record.accepted.clear();
            } else {
                record.accepted.remove(column);
            }
        }
        messages.push(if column == ALL {
            format!(
                "Do not accept any failure for {} samples\n\nbased on '{query}'",
                keys.len()
            )
        } else {
            format!(
                "Do not accept wrong {column} for {} samples\n\nbased on '{query}'",
                keys.len()
            )
        });
    }
    Ok(OverlayOutcome::Applied {
        messages,
        samples: keys.len(),
    })
}

/// Check every selector before mutating anything; typos must not turn
/// into silent no-ops.
fn missing_samples(table: &Table, selectors: &[FieldSelector]) -> Option<String> {
    let mut missing: Vec<&str> = selectors
        .iter()
        .filter(|s| !s.sample.is_all() && s.sample.resolve(table).is_empty())
        .map(|s| s.sample.pattern())
        .collect();
    if missing.is_empty() {
        return None;
    }
    missing.sort_unstable();
    missing.dedup();
    Some(format!("Missing samples {missing:?}"))
}

fn soft_failure(message: String, raise_error: bool) -> Result<OverlayOutcome> {
    if raise_error {
        Err(MetadiffError::Selection(message))
    } else {
        Ok(OverlayOutcome::MissingSamples { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KindRegistry, Table};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn meta() -> Table {
        Table::load(
            &strings(&["SampleName", "Country", "Elevation", "okexcept"]),
            vec![
                strings(&["Barboni_a1", "Italy", "10.0", ""]),
                strings(&["Beaudouin_a1", "France", "20.0", "Country,"]),
                strings(&["Beaudouin_a10", "France", "30.0", ""]),
            ],
            &KindRegistry::default(),
        )
        .unwrap()
    }

    fn selectors(raw: &[&str], exact: bool) -> Vec<FieldSelector> {
        raw.iter()
            .map(|s| FieldSelector::parse(s, exact).unwrap())
            .collect()
    }

    fn packed(table: &Table, key: &str) -> String {
        table.get(key).unwrap().accepted.pack()
    }

    #[test]
    fn accept_unions_into_the_exception_set() {
        let mut table = meta();
        let outcome = accept(
            &mut table,
            &selectors(&["Beaudouin_a1:Elevation"], true),
            true,
        )
        .unwrap();
        assert!(outcome.is_applied());
        assert_eq!(packed(&table, "Beaudouin_a1"), "Country,Elevation,");
        assert_eq!(packed(&table, "Beaudouin_a10"), "");
    }

    #[test]
    fn accept_is_idempotent() {
        let mut once = meta();
        let sel = selectors(&["all:Elevation"], false);
        accept(&mut once, &sel, true).unwrap();
        let mut twice = once.clone();
        accept(&mut twice, &sel, true).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unaccept_is_idempotent() {
        let mut once = meta();
        let sel = selectors(&["Beaudouin_a1:Country"], true);
        unaccept(&mut once, &sel, true).unwrap();
        let mut twice = once.clone();
        unaccept(&mut twice, &sel, true).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unaccept_cancels_a_previous_accept() {
        let mut table = meta();
        let before = packed(&table, "Barboni_a1");
        let sel = selectors(&["Barboni_a1:Country"], true);
        accept(&mut table, &sel, true).unwrap();
        assert_eq!(packed(&table, "Barboni_a1"), "Country,");
        unaccept(&mut table, &sel, true).unwrap();
        assert_eq!(packed(&table, "Barboni_a1"), before);
    }

    #[test]
    fn independent_accepts_commute() {
        let a = selectors(&["Barboni_a1:Country"], true);
        let b = selectors(&["Barboni_a1:Elevation"], true);
        let mut ab = meta();
        accept(&mut ab, &a, true).unwrap();
        accept(&mut ab, &b, true).unwrap();
        let mut ba = meta();
        accept(&mut ba, &b, true).unwrap();
        accept(&mut ba, &a, true).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn substring_selection_touches_near_matches() {
        let mut table = meta();
        accept(
            &mut table,
            &selectors(&["Beaudouin_a1:Elevation"], false),
            true,
        )
        .unwrap();
        // without exact matching the a10 sample is swept up as well
        assert!(table.get("Beaudouin_a1").unwrap().accepted.contains("Elevation"));
        assert!(table.get("Beaudouin_a10").unwrap().accepted.contains("Elevation"));
    }

    #[test]
    fn accept_all_then_global_reset() {
        let mut table = meta();
        accept(&mut table, &selectors(&["all:Elevation"], false), true).unwrap();
        for record in table.records() {
            assert!(record.accepted.contains("Elevation"));
        }
        unaccept(&mut table, &selectors(&["all:all"], false), true).unwrap();
        for record in table.records() {
            assert!(record.accepted.is_empty());
        }
    }

    #[test]
    fn unaccept_column_all_clears_one_sample() {
        let mut table = meta();
        accept(&mut table, &selectors(&["Beaudouin_a1:Elevation"], true), true).unwrap();
        unaccept(&mut table, &selectors(&["Beaudouin_a1:all"], true), true).unwrap();
        assert_eq!(packed(&table, "Beaudouin_a1"), "");
        // the other samples keep their sets
        assert_eq!(packed(&table, "Barboni_a1"), "");
    }

    #[test]
    fn unaccept_on_a_clean_table_is_a_noop() {
        let mut table = meta();
        unaccept(&mut table, &selectors(&["all:all"], false), true).unwrap();
        let snapshot = table.clone();
        let outcome = unaccept(&mut table, &selectors(&["Barboni_a1:Country"], true), true).unwrap();
        assert_eq!(
            outcome,
            OverlayOutcome::Applied {
                messages: Vec::new(),
                samples: 0
            }
        );
        assert_eq!(table, snapshot);
    }

    #[test]
    fn unknown_sample_fails_closed() {
        let mut table = meta();
        let err = accept(
            &mut table,
            &selectors(&["Nosuch_a1:Country", "Barboni_a1:Country"], true),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, MetadiffError::Selection(_)));
        // fail-closed: the valid selector was not applied either
        assert_eq!(packed(&table, "Barboni_a1"), "");
    }

    #[test]
    fn soft_mode_returns_the_message() {
        let mut table = meta();
        let outcome = accept(
            &mut table,
            &selectors(&["Nosuch_a1:Country"], true),
            false,
        )
        .unwrap();
        match outcome {
            OverlayOutcome::MissingSamples { message } => {
                assert!(message.contains("Nosuch_a1"));
            }
            other => panic!("expected missing samples, got {other:?}"),
        }
    }

    #[test]
    fn query_variants_use_resolved_keys() {
        let mut table = meta();
        let keys = strings(&["Barboni_a1", "Beaudouin_a10"]);
        accept_query(
            &mut table,
            &keys,
            &strings(&["Latitude"]),
            "Latitude is NULL",
            true,
        )
        .unwrap();
        assert_eq!(packed(&table, "Barboni_a1"), "Latitude,");
        assert_eq!(packed(&table, "Beaudouin_a10"), "Latitude,");
        assert_eq!(packed(&table, "Beaudouin_a1"), "Country,");

        unaccept_query(
            &mut table,
            &keys,
            &strings(&["Latitude"]),
            "Latitude is NULL",
            true,
        )
        .unwrap();
        assert_eq!(packed(&table, "Barboni_a1"), "");
    }

    #[test]
    fn empty_query_selection_is_an_error_when_raising() {
        let mut table = meta();
        let err = accept_query(&mut table, &[], &strings(&["Country"]), "1 = 0", true)
            .unwrap_err();
        assert!(matches!(err, MetadiffError::Selection(_)));
    }
}
