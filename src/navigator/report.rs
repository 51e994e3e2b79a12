use std::fmt;

/// Why a row produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The detail page could not be loaded or lacked its container
    DetailFailed(String),
    /// The row had no usable detail link
    TargetUnresolved,
    /// Row and detail together did not make a complete record
    Incomplete,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetailFailed(reason) => write!(f, "detail failed: {}", reason),
            Self::TargetUnresolved => write!(f, "no detail link"),
            Self::Incomplete => write!(f, "incomplete record"),
        }
    }
}

/// A skipped row and the reason it was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipDiagnostic {
    pub row: String,
    pub reason: SkipReason,
}

/// Outcome of a traversal
#[derive(Debug, Clone)]
pub struct TraversalReport<R> {
    /// Records in list order
    pub records: Vec<R>,
    pub skipped: Vec<SkipDiagnostic>,
    /// Rows matched by the row selector
    pub rows_seen: usize,
    /// Rows rejected before any navigation
    pub rows_filtered: usize,
    /// Records taken from the durable store instead of the portal
    pub reused: usize,
    /// Records assembled without their detail page
    pub degraded: usize,
    /// True when the list page was lost and remaining rows were abandoned
    pub aborted: bool,
    pub categories_skipped: Vec<String>,
}

impl<R> Default for TraversalReport<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
            rows_seen: 0,
            rows_filtered: 0,
            reused: 0,
            degraded: 0,
            aborted: false,
            categories_skipped: Vec::new(),
        }
    }
}

impl<R> TraversalReport<R> {
    /// Folds another report (e.g. the next category) into this one
    pub fn merge(&mut self, other: TraversalReport<R>) {
        self.records.extend(other.records);
        self.skipped.extend(other.skipped);
        self.rows_seen += other.rows_seen;
        self.rows_filtered += other.rows_filtered;
        self.reused += other.reused;
        self.degraded += other.degraded;
        self.aborted |= other.aborted;
        self.categories_skipped.extend(other.categories_skipped);
    }

    /// True when rows were loaded but every one was filtered out
    pub fn all_filtered(&self) -> bool {
        self.rows_seen > 0 && self.rows_filtered == self.rows_seen
    }
}
