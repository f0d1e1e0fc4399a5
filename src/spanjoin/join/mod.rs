//! Interval join over two tables.
//!
//! The pipeline: the normalizer resolves the on-specification into one
//! canonical interval per row on each side, the sweep-line core produces
//! every overlapping pair with its intersection, and the reconciler merges
//! the two schemas and materializes the output table, optionally completing
//! unmatched rows when retention is requested.

pub mod grouped;
pub mod reconcile;
pub mod spec;
pub(crate) mod sweep;

use log::debug;

pub use grouped::{groupby_interval_join, GroupIter, GroupSpec, GroupedJoinView};
pub use reconcile::{RenamePair, Renamer};
pub use spec::{IntervalLike, IntervalTransform, OnSpec, SideSpec};

use crate::spanjoin::error::SpanJoinResult;
use crate::spanjoin::table::Table;

/// Options for [`interval_join`] and [`groupby_interval_join`].
///
/// Defaults mirror the conventional surface: non-join columns keep their
/// names, the per-side on columns gain `_left` / `_right` suffixes, name
/// collisions are errors, unmatched rows are dropped, and the overlap
/// column takes the left on-column's name.
#[derive(Debug, Clone)]
pub struct JoinOptions {
    /// Where each side's intervals come from (required).
    pub on: OnSpec,
    /// Rename rules for non-join columns.
    pub renamecols: RenamePair,
    /// Rename rules for the per-side on columns.
    pub renameon: RenamePair,
    /// Deduplicate colliding output names instead of failing.
    pub makeunique: bool,
    /// Keep unmatched left rows, null-filling right-derived columns.
    pub keepleft: bool,
    /// Keep unmatched right rows, null-filling left-derived columns.
    pub keepright: bool,
    /// Name of the overlap column; defaults to the left on name.
    pub outcol: Option<String>,
}

impl JoinOptions {
    /// Create options joining on the given specification.
    pub fn on(on: OnSpec) -> Self {
        Self {
            on,
            renamecols: RenamePair::default(),
            renameon: RenamePair::suffixes("_left", "_right"),
            makeunique: false,
            keepleft: false,
            keepright: false,
            outcol: None,
        }
    }

    /// Set the rename rules for non-join columns.
    pub fn with_renamecols(mut self, left: Renamer, right: Renamer) -> Self {
        self.renamecols = RenamePair::new(left, right);
        self
    }

    /// Set the rename rules for the per-side on columns.
    pub fn with_renameon(mut self, left: Renamer, right: Renamer) -> Self {
        self.renameon = RenamePair::new(left, right);
        self
    }

    /// Deduplicate colliding output names with integer suffixes.
    pub fn with_makeunique(mut self, makeunique: bool) -> Self {
        self.makeunique = makeunique;
        self
    }

    /// Keep unmatched left rows.
    pub fn with_keepleft(mut self, keepleft: bool) -> Self {
        self.keepleft = keepleft;
        self
    }

    /// Keep unmatched right rows.
    pub fn with_keepright(mut self, keepright: bool) -> Self {
        self.keepright = keepright;
        self
    }

    /// Name the overlap column.
    pub fn with_outcol(mut self, outcol: impl Into<String>) -> Self {
        self.outcol = Some(outcol.into());
        self
    }
}

/// Join two tables on the intervals their rows represent.
///
/// The output has one row for every pairing of rows whose intervals
/// overlap, carrying the left row's columns, the right row's columns, and
/// the intersection of the two intervals. With `keepleft` / `keepright`,
/// unmatched rows of that side are appended with the counterpart columns
/// null-filled.
pub fn interval_join(left: &Table, right: &Table, options: &JoinOptions) -> SpanJoinResult<Table> {
    let (left_spec, right_spec) = options.on.resolve()?;

    let left_norm = spec::normalize(left, &left_spec)?;
    let right_norm = spec::normalize(right, &right_spec)?;
    spec::check_families(&left_norm, &right_norm)?;

    let schema = reconcile::build_schema(left, right, &left_spec, &right_spec, options)?;

    let pairs = sweep::sweep_join(&left_norm, &right_norm);
    debug!(
        "interval join: {} x {} rows -> {} overlapping pairs",
        left.row_count(),
        right.row_count(),
        pairs.len()
    );

    let keep_left = if options.keepleft {
        unmatched(left.row_count(), pairs.iter().map(|p| p.left_row))
    } else {
        Vec::new()
    };
    let keep_right = if options.keepright {
        unmatched(right.row_count(), pairs.iter().map(|p| p.right_row))
    } else {
        Vec::new()
    };

    reconcile::materialize(
        &schema,
        left,
        right,
        &left_norm,
        &right_norm,
        &pairs,
        &keep_left,
        &keep_right,
    )
}

/// Row indices with no matches, in ascending order.
fn unmatched(row_count: usize, matched: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut seen = vec![false; row_count];
    for row in matched {
        seen[row] = true;
    }
    seen.iter()
        .enumerate()
        .filter(|(_, &hit)| !hit)
        .map(|(row, _)| row)
        .collect()
}
