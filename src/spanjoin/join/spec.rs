//! Join column specifications and the interval normalizer.
//!
//! An on-specification names where each side's intervals come from: a column
//! shared by both tables, a per-side column pair, or a transform computing an
//! interval from one or more columns. The normalizer resolves a spec against
//! a table into one canonical [`TaggedInterval`] per row, validating
//! everything eagerly so the join core never sees a malformed interval.

use std::fmt;
use std::sync::Arc;

use crate::spanjoin::error::{SpanJoinError, SpanJoinResult};
use crate::spanjoin::interval::{BoundValue, Interval, TaggedInterval};
use crate::spanjoin::table::{FieldValue, Table};

/// A transform from one row's selected column values to an interval-like
/// value. Receives the values positionally, in the order the columns were
/// named in the spec.
pub type IntervalTransform =
    dyn Fn(&[FieldValue]) -> SpanJoinResult<IntervalLike> + Send + Sync;

/// A value coercible to an [`Interval`]: either an interval itself or a
/// `(start, stop)` span pair, read as half-open.
#[derive(Debug, Clone)]
pub enum IntervalLike {
    Interval(Interval),
    Span(BoundValue, BoundValue),
}

impl IntervalLike {
    /// Coerce into a validated interval.
    pub fn into_interval(self) -> SpanJoinResult<Interval> {
        match self {
            IntervalLike::Interval(iv) => Ok(iv),
            IntervalLike::Span(start, stop) => Interval::half_open(start, stop),
        }
    }
}

impl From<Interval> for IntervalLike {
    fn from(iv: Interval) -> Self {
        IntervalLike::Interval(iv)
    }
}

impl From<(BoundValue, BoundValue)> for IntervalLike {
    fn from((start, stop): (BoundValue, BoundValue)) -> Self {
        IntervalLike::Span(start, stop)
    }
}

/// Where one side's intervals come from.
#[derive(Clone)]
pub enum SideSpec {
    /// A column whose cells are interval values.
    Column(String),
    /// A transform over one or more columns producing an interval-like value
    /// per row.
    Transformed {
        columns: Vec<String>,
        transform: Arc<IntervalTransform>,
    },
}

impl SideSpec {
    /// Create a column side-spec.
    pub fn column(name: impl Into<String>) -> Self {
        SideSpec::Column(name.into())
    }

    /// Create a transform side-spec over the named columns.
    pub fn transformed<F>(columns: Vec<impl Into<String>>, transform: F) -> Self
    where
        F: Fn(&[FieldValue]) -> SpanJoinResult<IntervalLike> + Send + Sync + 'static,
    {
        SideSpec::Transformed {
            columns: columns.into_iter().map(Into::into).collect(),
            transform: Arc::new(transform),
        }
    }

    /// The source column that holds this side's intervals directly, when the
    /// spec is a plain column reference.
    pub(crate) fn on_column(&self) -> Option<&str> {
        match self {
            SideSpec::Column(name) => Some(name),
            SideSpec::Transformed { .. } => None,
        }
    }

    /// Base name used when deriving output column names for this side's
    /// intervals: the column name itself, or the first input column of a
    /// transform.
    pub(crate) fn base_name(&self) -> &str {
        match self {
            SideSpec::Column(name) => name,
            SideSpec::Transformed { columns, .. } => {
                columns.first().map(|s| s.as_str()).unwrap_or("span")
            }
        }
    }

    fn validate(&self) -> SpanJoinResult<()> {
        if let SideSpec::Transformed { columns, .. } = self {
            if columns.is_empty() {
                return Err(SpanJoinError::specification(
                    "transform spec must name at least one input column",
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SideSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideSpec::Column(name) => f.debug_tuple("Column").field(name).finish(),
            SideSpec::Transformed { columns, .. } => f
                .debug_struct("Transformed")
                .field("columns", columns)
                .field("transform", &"<fn>")
                .finish(),
        }
    }
}

/// The join's on-specification, resolved once at call time by exhaustive
/// matching.
#[derive(Clone)]
pub enum OnSpec {
    /// One column name present in both tables.
    Shared(String),
    /// Different column names on each side.
    Renamed { left: String, right: String },
    /// The same transform applied to both sides.
    Transformed {
        columns: Vec<String>,
        transform: Arc<IntervalTransform>,
    },
    /// Fully asymmetric per-side specs.
    PerSide { left: SideSpec, right: SideSpec },
}

impl OnSpec {
    /// Join on a column shared by both tables.
    pub fn shared(name: impl Into<String>) -> Self {
        OnSpec::Shared(name.into())
    }

    /// Join on differently named columns.
    pub fn renamed(left: impl Into<String>, right: impl Into<String>) -> Self {
        OnSpec::Renamed {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Join on a transform of the named columns, applied to both sides.
    pub fn transformed<F>(columns: Vec<impl Into<String>>, transform: F) -> Self
    where
        F: Fn(&[FieldValue]) -> SpanJoinResult<IntervalLike> + Send + Sync + 'static,
    {
        OnSpec::Transformed {
            columns: columns.into_iter().map(Into::into).collect(),
            transform: Arc::new(transform),
        }
    }

    /// Join on asymmetric per-side specs.
    pub fn per_side(left: SideSpec, right: SideSpec) -> Self {
        OnSpec::PerSide { left, right }
    }

    /// Resolve into per-side specs, validating the shape.
    pub(crate) fn resolve(&self) -> SpanJoinResult<(SideSpec, SideSpec)> {
        let (left, right) = match self {
            OnSpec::Shared(name) => (SideSpec::Column(name.clone()), SideSpec::Column(name.clone())),
            OnSpec::Renamed { left, right } => (
                SideSpec::Column(left.clone()),
                SideSpec::Column(right.clone()),
            ),
            OnSpec::Transformed { columns, transform } => {
                let side = SideSpec::Transformed {
                    columns: columns.clone(),
                    transform: Arc::clone(transform),
                };
                (side.clone(), side)
            }
            OnSpec::PerSide { left, right } => (left.clone(), right.clone()),
        };
        left.validate()?;
        right.validate()?;
        Ok((left, right))
    }
}

impl fmt::Debug for OnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnSpec::Shared(name) => f.debug_tuple("Shared").field(name).finish(),
            OnSpec::Renamed { left, right } => f
                .debug_struct("Renamed")
                .field("left", left)
                .field("right", right)
                .finish(),
            OnSpec::Transformed { columns, .. } => f
                .debug_struct("Transformed")
                .field("columns", columns)
                .field("transform", &"<fn>")
                .finish(),
            OnSpec::PerSide { left, right } => f
                .debug_struct("PerSide")
                .field("left", left)
                .field("right", right)
                .finish(),
        }
    }
}

/// Resolve a side-spec against a table into one tagged interval per row, in
/// original row order.
pub(crate) fn normalize(table: &Table, spec: &SideSpec) -> SpanJoinResult<Vec<TaggedInterval>> {
    match spec {
        SideSpec::Column(name) => {
            let cells = table.require_column(name)?;
            cells
                .iter()
                .enumerate()
                .map(|(row, cell)| match cell {
                    FieldValue::Interval(iv) => Ok(TaggedInterval {
                        row,
                        interval: iv.clone(),
                    }),
                    other => Err(SpanJoinError::specification_for(
                        name.clone(),
                        format!(
                            "column '{}' row {}: expected an INTERVAL cell, got {}",
                            name,
                            row,
                            other.type_name()
                        ),
                    )),
                })
                .collect()
        }
        SideSpec::Transformed { columns, transform } => {
            let inputs: Vec<&[FieldValue]> = columns
                .iter()
                .map(|name| table.require_column(name))
                .collect::<SpanJoinResult<_>>()?;
            (0..table.row_count())
                .map(|row| {
                    let args: Vec<FieldValue> =
                        inputs.iter().map(|col| col[row].clone()).collect();
                    let interval = transform.as_ref()(&args)?.into_interval()?;
                    Ok(TaggedInterval { row, interval })
                })
                .collect()
        }
    }
}

/// Reject joins whose two sides carry incomparable interval bounds.
pub(crate) fn check_families(
    left: &[TaggedInterval],
    right: &[TaggedInterval],
) -> SpanJoinResult<()> {
    let mut family = None;
    for tagged in left.iter().chain(right.iter()) {
        let f = tagged.interval.family();
        match family {
            None => family = Some(f),
            Some(expected) if expected != f => {
                return Err(SpanJoinError::specification(
                    "interval bounds mix numeric and temporal values across the join inputs",
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_cell(start: i64, stop: i64) -> FieldValue {
        FieldValue::Interval(Interval::half_open(start, stop).unwrap())
    }

    fn spans_table() -> Table {
        Table::from_columns(vec![
            (
                "span",
                vec![span_cell(0, 10), span_cell(10, 20)],
            ),
            (
                "lo",
                vec![FieldValue::Integer(0), FieldValue::Integer(10)],
            ),
            (
                "hi",
                vec![FieldValue::Integer(10), FieldValue::Integer(20)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_normalize_column() {
        let t = spans_table();
        let tagged = normalize(&t, &SideSpec::column("span")).unwrap();
        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[0].row, 0);
        assert_eq!(tagged[1].interval, Interval::half_open(10, 20).unwrap());
    }

    #[test]
    fn test_normalize_missing_column() {
        let t = spans_table();
        let err = normalize(&t, &SideSpec::column("nope")).unwrap_err();
        assert!(matches!(err, SpanJoinError::Specification { .. }));
    }

    #[test]
    fn test_normalize_non_interval_cell() {
        let t = spans_table();
        let err = normalize(&t, &SideSpec::column("lo")).unwrap_err();
        assert!(err.to_string().contains("INTERVAL"));
    }

    #[test]
    fn test_normalize_transform() {
        let t = spans_table();
        let spec = SideSpec::transformed(vec!["lo", "hi"], |args: &[FieldValue]| {
            let start = args[0].to_bound().ok_or_else(|| {
                SpanJoinError::specification("lo is not a bound value")
            })?;
            let stop = args[1].to_bound().ok_or_else(|| {
                SpanJoinError::specification("hi is not a bound value")
            })?;
            Ok(IntervalLike::Span(start, stop))
        });
        let tagged = normalize(&t, &spec).unwrap();
        assert_eq!(tagged[0].interval, Interval::half_open(0, 10).unwrap());
        assert_eq!(tagged[1].interval, Interval::half_open(10, 20).unwrap());
    }

    #[test]
    fn test_transform_bad_interval_is_domain_error() {
        let t = spans_table();
        let spec = SideSpec::transformed(vec!["hi", "lo"], |args: &[FieldValue]| {
            // Reversed bounds: start after stop.
            Ok(IntervalLike::Span(
                args[0].to_bound().expect("numeric"),
                args[1].to_bound().expect("numeric"),
            ))
        });
        let err = normalize(&t, &spec).unwrap_err();
        assert!(matches!(err, SpanJoinError::Domain { .. }));
    }

    #[test]
    fn test_empty_transform_columns_rejected() {
        let spec = OnSpec::transformed(Vec::<String>::new(), |_: &[FieldValue]| {
            Ok(IntervalLike::Span(BoundValue::Integer(0), BoundValue::Integer(1)))
        });
        assert!(spec.resolve().is_err());
    }

    #[test]
    fn test_resolve_shapes() {
        let (l, r) = OnSpec::shared("span").resolve().unwrap();
        assert_eq!(l.on_column(), Some("span"));
        assert_eq!(r.on_column(), Some("span"));

        let (l, r) = OnSpec::renamed("a", "b").resolve().unwrap();
        assert_eq!(l.on_column(), Some("a"));
        assert_eq!(r.on_column(), Some("b"));
    }
}
