//! Quantile window generation.
//!
//! Divides a span into `n` contiguous, equal-duration sub-intervals and
//! materializes them as a table with a span column and a label column,
//! usable as the right operand of an interval join to bucket the left
//! table's rows by time.

use log::debug;
use rust_decimal::Decimal;

use crate::spanjoin::error::{SpanJoinError, SpanJoinResult};
use crate::spanjoin::interval::{BoundValue, Closure, Interval, SpanLength};
use crate::spanjoin::table::{FieldValue, Table};

/// The span to divide: a literal interval, or a table whose span column's
/// union bounding box is used.
#[derive(Debug, Clone)]
pub enum SpanSource<'a> {
    Interval(Interval),
    Table(&'a Table),
}

impl From<Interval> for SpanSource<'static> {
    fn from(iv: Interval) -> Self {
        SpanSource::Interval(iv)
    }
}

impl<'a> From<&'a Table> for SpanSource<'a> {
    fn from(table: &'a Table) -> Self {
        SpanSource::Table(table)
    }
}

/// The label column of the generated window table.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelSpec {
    /// A column named `count` holding `1..=n`.
    Counter,
    /// A caller-supplied column name and `n` ordered values.
    Values {
        name: String,
        values: Vec<FieldValue>,
    },
}

impl Default for LabelSpec {
    fn default() -> Self {
        LabelSpec::Counter
    }
}

/// Options for [`quantile_windows`].
#[derive(Debug, Clone)]
pub struct WindowOptions {
    /// Name of the span column in the output, and of the column read when
    /// the span source is a table. Default `"span"`.
    pub span_column: String,
    /// Label column specification. Default: `count` = `1..=n`.
    pub label: LabelSpec,
    /// Minimum acceptable window duration. Default: three-quarters of the
    /// ideal per-window duration.
    pub min_duration: Option<SpanLength>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            span_column: "span".to_string(),
            label: LabelSpec::Counter,
            min_duration: None,
        }
    }
}

impl WindowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the span column name.
    pub fn with_span_column(mut self, name: impl Into<String>) -> Self {
        self.span_column = name.into();
        self
    }

    /// Label windows with a named column of supplied values.
    pub fn with_labels(mut self, name: impl Into<String>, values: Vec<FieldValue>) -> Self {
        self.label = LabelSpec::Values {
            name: name.into(),
            values,
        };
        self
    }

    /// Set the minimum acceptable window duration.
    pub fn with_min_duration(mut self, min: SpanLength) -> Self {
        self.min_duration = Some(min);
        self
    }
}

/// Generate a table of `n` contiguous, equal-duration sub-intervals of
/// `span`, in ascending order, covering it exactly.
///
/// Each boundary is computed directly from its index, so the first window
/// starts exactly at the span's start and the last window stops exactly at
/// its stop, with no drift from repeated addition. Fails with a domain
/// error when `n` is zero or when the resulting duration falls below the
/// minimum, which signals that `n` is too large for the span.
pub fn quantile_windows(
    n: usize,
    span: SpanSource<'_>,
    options: &WindowOptions,
) -> SpanJoinResult<Table> {
    if n == 0 {
        return Err(SpanJoinError::domain("window count must be positive"));
    }

    let span = match span {
        SpanSource::Interval(iv) => iv,
        SpanSource::Table(table) => bounding_span(table, &options.span_column)?,
    };

    let length = span.span_length();
    let duration = length.divided_by(n);
    if !duration.is_positive() {
        return Err(SpanJoinError::domain(format!(
            "span {} is too small to divide into {} windows",
            span, n
        )));
    }

    let minimum = options
        .min_duration
        .unwrap_or_else(|| length.scaled(3, 4 * n as i64));
    match duration.partial_cmp(&minimum) {
        Some(std::cmp::Ordering::Less) => {
            return Err(SpanJoinError::domain(format!(
                "window duration {} is below the minimum {}; {} windows is too many for span {}",
                duration, minimum, n, span
            )));
        }
        Some(_) => {}
        None => {
            return Err(SpanJoinError::domain(format!(
                "minimum duration {} is not comparable with window duration {}",
                minimum, duration
            )));
        }
    }

    let labels = match &options.label {
        LabelSpec::Counter => (
            "count".to_string(),
            (1..=n as i64).map(FieldValue::Integer).collect(),
        ),
        LabelSpec::Values { name, values } => {
            if values.len() != n {
                return Err(SpanJoinError::specification_for(
                    name.clone(),
                    format!(
                        "label column '{}' has {} values for {} windows",
                        name,
                        values.len(),
                        n
                    ),
                ));
            }
            (name.clone(), values.clone())
        }
    };

    let mut boundaries = Vec::with_capacity(n + 1);
    for i in 0..=n {
        boundaries.push(boundary(&span, &length, i, n)?);
    }
    let mut windows = Vec::with_capacity(n);
    for i in 0..n {
        let interval = Interval::new(
            boundaries[i].clone(),
            boundaries[i + 1].clone(),
            Closure::ClosedOpen,
        )?;
        windows.push(FieldValue::Interval(interval));
    }

    debug!("quantile windows: {} windows over span {}", n, span);

    Table::from_columns(vec![
        (options.span_column.clone(), windows),
        (labels.0, labels.1),
    ])
}

/// The union bounding box of a table's span column: minimum start to
/// maximum stop, half-open.
fn bounding_span(table: &Table, span_column: &str) -> SpanJoinResult<Interval> {
    let cells = table.require_column(span_column)?;
    let mut bounds: Option<(BoundValue, BoundValue)> = None;
    for (row, cell) in cells.iter().enumerate() {
        let interval = cell.as_interval().ok_or_else(|| {
            SpanJoinError::specification_for(
                span_column.to_string(),
                format!(
                    "column '{}' row {}: expected an INTERVAL cell, got {}",
                    span_column,
                    row,
                    cell.type_name()
                ),
            )
        })?;
        bounds = Some(match bounds {
            None => (interval.start().clone(), interval.stop().clone()),
            Some((start, stop)) => {
                let start = if *interval.start() < start {
                    interval.start().clone()
                } else {
                    start
                };
                let stop = if *interval.stop() > stop {
                    interval.stop().clone()
                } else {
                    stop
                };
                (start, stop)
            }
        });
    }
    let (start, stop) = bounds.ok_or_else(|| {
        SpanJoinError::domain(format!(
            "cannot infer a span from empty column '{}'",
            span_column
        ))
    })?;
    Interval::new(start, stop, Closure::ClosedOpen)
}

/// Boundary `i` of `n`, computed directly from the index: the span's start
/// offset by `length * i / n`, with the ends pinned to the span's own
/// bounds. All boundaries are canonicalized to the length's kind so every
/// window carries uniformly typed bounds.
fn boundary(span: &Interval, length: &SpanLength, i: usize, n: usize) -> SpanJoinResult<BoundValue> {
    if i == 0 {
        return canonical(span.start(), length);
    }
    if i == n {
        return canonical(span.stop(), length);
    }
    let offset = length.scaled(i as i64, n as i64);
    let start = canonical(span.start(), length)?;
    match (start, offset) {
        (BoundValue::Float(s), SpanLength::Numeric(delta)) => Ok(BoundValue::Float(s + delta)),
        (BoundValue::Decimal(s), SpanLength::Decimal(delta)) => Ok(BoundValue::Decimal(s + delta)),
        (BoundValue::Timestamp(s), SpanLength::Time(delta)) => Ok(BoundValue::Timestamp(s + delta)),
        (start, _) => Err(SpanJoinError::domain(format!(
            "cannot offset {} bound by {} duration",
            start.type_name(),
            length
        ))),
    }
}

/// Canonical bound representation for a span length kind: floats for
/// numeric lengths, decimals for exact lengths, timestamps for time
/// lengths.
fn canonical(bound: &BoundValue, length: &SpanLength) -> SpanJoinResult<BoundValue> {
    let converted = match (length, bound) {
        (SpanLength::Numeric(_), b) if !matches!(b, BoundValue::Date(_) | BoundValue::Timestamp(_)) => {
            Some(BoundValue::Float(b.as_f64_lossy()))
        }
        (SpanLength::Decimal(_), BoundValue::Integer(i)) => {
            Some(BoundValue::Decimal(Decimal::from(*i)))
        }
        (SpanLength::Decimal(_), BoundValue::Decimal(d)) => Some(BoundValue::Decimal(*d)),
        (SpanLength::Time(_), b) => b.as_timestamp().map(BoundValue::Timestamp),
        _ => None,
    };
    converted.ok_or_else(|| {
        SpanJoinError::domain(format!(
            "span bound {} does not match its measured length {}",
            bound, length
        ))
    })
}
