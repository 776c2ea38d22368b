//! Sample selection strategies for overlay operations.

use regex::Regex;

use crate::error::{MetadiffError, Result};
use crate::model::Table;

/// Wildcard matching every sample (and, in the column position of a
/// selector, every column).
pub const ALL: &str = "all";

/// How a selector picks samples, resolved once to a list of keys.
#[derive(Debug, Clone)]
pub enum SampleSelector {
    /// Every sample in the table.
    All,
    /// The sample whose key equals the name.
    Exact(String),
    /// Samples whose key contains a match of the pattern.
    Pattern(Regex),
}

impl SampleSelector {
    /// Build a selector from the sample part of a `sample:column` pair.
    /// `"all"` is the wildcard; `exact` switches between key equality and
    /// regex substring search.
    pub fn new(sample: &str, exact: bool) -> Result<Self> {
        if sample == ALL {
            Ok(SampleSelector::All)
        } else if exact {
            Ok(SampleSelector::Exact(sample.to_string()))
        } else {
            Ok(SampleSelector::Pattern(Regex::new(sample)?))
        }
    }

    /// The pattern or name this selector was built from.
    pub fn pattern(&self) -> &str {
        match self {
            SampleSelector::All => ALL,
            SampleSelector::Exact(name) => name,
            SampleSelector::Pattern(regex) => regex.as_str(),
        }
    }

    /// Keys matched in table order. A pattern that matches nothing but is
    /// verbatim a key still selects that key, so a regex-special sample
    /// name does not slip through unmatched.
    pub fn resolve<'a>(&self, table: &'a Table) -> Vec<&'a str> {
        let matched: Vec<&str> = match self {
            SampleSelector::All => table.keys().collect(),
            SampleSelector::Exact(name) => {
                table.keys().filter(|key| *key == name.as_str()).collect()
            }
            SampleSelector::Pattern(regex) => {
                table.keys().filter(|key| regex.is_match(key)).collect()
            }
        };
        if matched.is_empty() {
            if let SampleSelector::Pattern(regex) = self {
                if let Ok(record) = table.get(regex.as_str()) {
                    return vec![record.key.as_str()];
                }
            }
        }
        matched
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SampleSelector::All)
    }
}

/// One `sample:column` selector as accepted on the command line.
#[derive(Debug, Clone)]
pub struct FieldSelector {
    pub sample: SampleSelector,
    pub column: String,
}

impl FieldSelector {
    pub fn new(sample: SampleSelector, column: impl Into<String>) -> Self {
        Self {
            sample,
            column: column.into(),
        }
    }

    /// Parse the `sample:column` form. The sample part may be `all`; the
    /// column part may be `all` for removal operations.
    pub fn parse(raw: &str, exact: bool) -> Result<Self> {
        let (sample, column) = raw.split_once(':').ok_or_else(|| {
            MetadiffError::Selection(format!(
                "malformed selector {raw:?}, expected 'sample:column'"
            ))
        })?;
        if column.is_empty() {
            return Err(MetadiffError::Selection(format!(
                "malformed selector {raw:?}, empty column"
            )));
        }
        Ok(Self::new(SampleSelector::new(sample, exact)?, column))
    }
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

    #[test]
    fn all_selects_everything() {
        let t = table(&["Barboni_a1", "Beaudouin_a1"]);
        let selector = SampleSelector::new("all", false).unwrap();
        assert_eq!(selector.resolve(&t).len(), 2);
    }

    #[test]
    fn pattern_is_substring_search() {
        let t = table(&["Beaudouin_a1", "Beaudouin_a10", "Barboni_a1"]);
        let selector = SampleSelector::new("Beaudouin_a1", false).unwrap();
        assert_eq!(selector.resolve(&t), vec!["Beaudouin_a1", "Beaudouin_a10"]);
    }

    #[test]
    fn exact_matches_whole_key() {
        let t = table(&["Beaudouin_a1", "Beaudouin_a10"]);
        let selector = SampleSelector::new("Beaudouin_a1", true).unwrap();
        assert_eq!(selector.resolve(&t), vec!["Beaudouin_a1"]);
    }

    #[test]
    fn verbatim_key_rescues_a_regex_that_matches_nothing() {
        let t = table(&["weird[1]"]);
        // as a regex this matches only "weird1", which is absent
        let selector = SampleSelector::new("weird[1]", false).unwrap();
        assert_eq!(selector.resolve(&t), vec!["weird[1]"]);
    }

    #[test]
    fn parse_splits_on_first_colon() {
        let selector = FieldSelector::parse("all:Country", false).unwrap();
        assert!(selector.sample.is_all());
        assert_eq!(selector.column, "Country");
        assert!(FieldSelector::parse("no-colon", false).is_err());
    }
}
