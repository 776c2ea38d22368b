//! Key join across two tables.

use rustc_hash::FxHashSet;

use crate::config::JoinMode;
use crate::model::{Record, Table};

/// One joined sample: the key plus whichever side carries it.
#[derive(Debug)]
pub struct JoinedRecord<'a> {
    pub key: &'a str,
    pub left: Option<&'a Record>,
    pub right: Option<&'a Record>,
}

impl JoinedRecord<'_> {
    /// Present on both sides, eligible for column-level comparison.
    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// Join two tables on the sample key.
///
/// Key order follows the side(s) retained by the mode: left order first,
/// with unmatched right keys appended for an outer join.
pub fn join<'a>(left: &'a Table, right: &'a Table, mode: JoinMode) -> Vec<JoinedRecord<'a>> {
    let mut joined = Vec::new();
    let mut matched: FxHashSet<&str> = FxHashSet::default();

    if mode != JoinMode::Right {
        for record in left.records() {
            let other = right.get(&record.key).ok();
            if other.is_some() {
                matched.insert(record.key.as_str());
            }
            match mode {
                JoinMode::Inner if other.is_none() => continue,
                _ => {}
            }
            joined.push(JoinedRecord {
                key: record.key.as_str(),
                left: Some(record),
                right: other,
            });
        }
    }

    match mode {
        JoinMode::Right => {
            for record in right.records() {
                joined.push(JoinedRecord {
                    key: record.key.as_str(),
                    left: left.get(&record.key).ok(),
                    right: Some(record),
                });
            }
        }
        JoinMode::Outer => {
            for record in right.records() {
                if !matched.contains(record.key.as_str()) {
                    joined.push(JoinedRecord {
                        key: record.key.as_str(),
                        left: None,
                        right: Some(record),
                    });
                }
            }
        }
        JoinMode::Inner | JoinMode::Left => {}
    }

    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Column, Record};

    fn table(keys: &[&str]) -> Table {
        let mut t = Table::new(vec![Column::plain("Country")]);
        for key in keys {
            t.push(Record::new(*key, vec![CellValue::from("x")])).unwrap();
        }
        t
    }

    fn keys<'a>(joined: &[JoinedRecord<'a>]) -> Vec<&'a str> {
        joined.iter().map(|j| j.key).collect()
    }

    #[test]
    fn inner_keeps_shared_keys_in_left_order() {
        let left = table(&["a", "b", "c"]);
        let right = table(&["c", "b", "d"]);
        let joined = join(&left, &right, JoinMode::Inner);
        assert_eq!(keys(&joined), vec!["b", "c"]);
        assert!(joined.iter().all(JoinedRecord::is_complete));
    }

    #[test]
    fn outer_appends_unmatched_right_keys() {
        let left = table(&["a", "b"]);
        let right = table(&["b", "d"]);
        let joined = join(&left, &right, JoinMode::Outer);
        assert_eq!(keys(&joined), vec!["a", "b", "d"]);
        assert!(joined[0].right.is_none());
        assert!(joined[2].left.is_none());
    }

    #[test]
    fn left_and_right_keep_one_side() {
        let left = table(&["a", "b"]);
        let right = table(&["b", "d"]);
        assert_eq!(keys(&join(&left, &right, JoinMode::Left)), vec!["a", "b"]);
        assert_eq!(keys(&join(&left, &right, JoinMode::Right)), vec!["b", "d"]);
    }
}
