//! Configuration for reconciliation runs.

/// Default absolute tolerance for numeric comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Which sample keys appear in the reconciliation result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinMode {
    /// Keys present in both tables.
    #[default]
    Inner,
    /// Union of keys from both tables.
    Outer,
    /// Keys from the left table only.
    Left,
    /// Keys from the right table only.
    Right,
}

impl std::str::FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inner" => Ok(JoinMode::Inner),
            "outer" => Ok(JoinMode::Outer),
            "left" => Ok(JoinMode::Left),
            "right" => Ok(JoinMode::Right),
            _ => Err(format!("unknown join mode: {s}")),
        }
    }
}

/// Which columns the reconciliation report carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    /// Changed columns, values from the left table.
    #[default]
    LeftDiff,
    /// Changed columns, values from the right table.
    RightDiff,
    /// Changed columns from both sides, right-sourced suffixed `_r`.
    BothDiff,
    /// All left columns.
    Left,
    /// All right columns.
    Right,
    /// All columns from both sides, right-sourced suffixed `_r`.
    Both,
    /// Intersection of both column sets, values from the left table.
    Inner,
}

impl std::str::FromStr for Projection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "leftdiff" | "left-diff" => Ok(Projection::LeftDiff),
            "rightdiff" | "right-diff" => Ok(Projection::RightDiff),
            "bothdiff" | "both-diff" => Ok(Projection::BothDiff),
            "left" => Ok(Projection::Left),
            "right" => Ok(Projection::Right),
            "both" => Ok(Projection::Both),
            "inner" => Ok(Projection::Inner),
            _ => Err(format!("unknown projection: {s}")),
        }
    }
}

/// Configuration for [`crate::diff::reconcile`], all fields defaulted.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Which keys to retain.
    pub join_mode: JoinMode,
    /// Columns to compare; `None` means the intersection of both tables'
    /// columns.
    pub compare_columns: Option<Vec<String>>,
    /// Columns removed from the comparison regardless of source.
    pub exclude_columns: Vec<String>,
    /// Absolute tolerance for numeric comparisons.
    pub tolerance: f64,
    /// Output column selection.
    pub projection: Projection,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            join_mode: JoinMode::default(),
            compare_columns: None,
            exclude_columns: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
            projection: Projection::default(),
        }
    }
}

impl ReconcileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_join_mode(mut self, mode: JoinMode) -> Self {
        self.join_mode = mode;
        self
    }

    pub fn with_compare_columns(mut self, columns: Vec<String>) -> Self {
        self.compare_columns = Some(columns);
        self
    }

    pub fn with_exclude_columns(mut self, columns: Vec<String>) -> Self {
        self.exclude_columns = columns;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}
