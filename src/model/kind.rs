//! Column classification driving type-aware comparison.

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Number of positions in a packed climate series: twelve monthly means,
/// four seasonal means and the annual mean.
pub const SERIES_LEN: usize = 17;

/// How the cells of a column are interpreted and compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnKind {
    /// Trimmed, newline-normalized, case-sensitive string comparison.
    #[default]
    PlainText,
    /// Floating value compared with an absolute tolerance.
    Numeric,
    /// Comma-delimited climate series compared position-wise.
    NumericArray,
    /// Boolean-like value, absent means false.
    Flag,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::PlainText => write!(f, "plain-text"),
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::NumericArray => write!(f, "numeric-array"),
            ColumnKind::Flag => write!(f, "flag"),
        }
    }
}

const NUMERIC_COLUMNS: &[&str] = &[
    "Latitude",
    "Longitude",
    "Elevation",
    "AreaOfSite",
    "AgeBP",
    "count",
    "percentage",
];

const SERIES_COLUMNS: &[&str] = &["Temperature", "Precipitation"];

const FLAG_COLUMNS: &[&str] = &["ispercent"];

/// Registry mapping column names to their kind.
///
/// Unknown columns default to [`ColumnKind::PlainText`]. The default
/// registry carries the fixed meta-format classification.
#[derive(Debug, Clone, PartialEq)]
pub struct KindRegistry {
    kinds: FxHashMap<String, ColumnKind>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        let mut kinds = FxHashMap::default();
        for name in NUMERIC_COLUMNS {
            kinds.insert((*name).to_string(), ColumnKind::Numeric);
        }
        for name in SERIES_COLUMNS {
            kinds.insert((*name).to_string(), ColumnKind::NumericArray);
        }
        for name in FLAG_COLUMNS {
            kinds.insert((*name).to_string(), ColumnKind::Flag);
        }
        Self { kinds }
    }
}

impl KindRegistry {
    /// Registry with no classified columns (everything is plain text).
    pub fn empty() -> Self {
        Self {
            kinds: FxHashMap::default(),
        }
    }

    /// Kind of the given column, `PlainText` for unknown names.
    pub fn kind_of(&self, column: &str) -> ColumnKind {
        self.kinds.get(column).copied().unwrap_or_default()
    }

    /// Override the kind for a column.
    pub fn set(&mut self, column: impl Into<String>, kind: ColumnKind) {
        self.kinds.insert(column.into(), kind);
    }
}
