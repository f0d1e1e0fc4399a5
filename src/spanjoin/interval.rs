//! Interval values and interval algebra.
//!
//! An [`Interval`] is a range between two comparable bound values with an
//! inclusivity flag per bound. Intervals are the join keys of this engine:
//! two rows pair up when their intervals overlap, and the materialized value
//! of the pairing is the intersection of the two intervals.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::spanjoin::error::{SpanJoinError, SpanJoinResult};

/// A comparable scalar usable as an interval endpoint.
///
/// Numeric variants compare with each other by value; `Date` compares with
/// `Timestamp` as midnight of that day. Numeric and temporal values never
/// mix inside one interval (that is a domain error at construction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BoundValue {
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// Decimal value for precise arithmetic
    Decimal(Decimal),
    /// Calendar date, treated as midnight when compared with timestamps
    Date(NaiveDate),
    /// Naive timestamp
    Timestamp(NaiveDateTime),
}

/// Bound family: values only order meaningfully within one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum BoundFamily {
    Numeric,
    Temporal,
}

impl BoundValue {
    pub(crate) fn family(&self) -> BoundFamily {
        match self {
            BoundValue::Integer(_) | BoundValue::Float(_) | BoundValue::Decimal(_) => {
                BoundFamily::Numeric
            }
            BoundValue::Date(_) | BoundValue::Timestamp(_) => BoundFamily::Temporal,
        }
    }

    /// Lossy numeric view, used for cross-variant numeric comparison.
    pub(crate) fn as_f64_lossy(&self) -> f64 {
        match self {
            BoundValue::Integer(i) => *i as f64,
            BoundValue::Float(f) => *f,
            BoundValue::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
            BoundValue::Date(_) | BoundValue::Timestamp(_) => f64::NAN,
        }
    }

    /// Temporal view, promoting dates to midnight.
    pub(crate) fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            BoundValue::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            BoundValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    fn is_nan(&self) -> bool {
        matches!(self, BoundValue::Float(f) if f.is_nan())
    }

    /// Type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            BoundValue::Integer(_) => "INTEGER",
            BoundValue::Float(_) => "FLOAT",
            BoundValue::Decimal(_) => "DECIMAL",
            BoundValue::Date(_) => "DATE",
            BoundValue::Timestamp(_) => "TIMESTAMP",
        }
    }
}

impl Ord for BoundValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use BoundValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Decimal(a), Decimal(b)) => a.cmp(b),
            (Integer(a), Decimal(b)) => rust_decimal::Decimal::from(*a).cmp(b),
            (Decimal(a), Integer(b)) => a.cmp(&rust_decimal::Decimal::from(*b)),
            (Date(a), Date(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Date(a), Timestamp(b)) => a.and_time(NaiveTime::MIN).cmp(b),
            (Timestamp(a), Date(b)) => a.cmp(&b.and_time(NaiveTime::MIN)),
            (a, b) if a.family() == BoundFamily::Numeric && b.family() == BoundFamily::Numeric => {
                a.as_f64_lossy().total_cmp(&b.as_f64_lossy())
            }
            // Cross-family ordering is arbitrary but total; joins reject mixed
            // families before ordering matters.
            (a, b) => a.family().cmp(&b.family()),
        }
    }
}

impl PartialOrd for BoundValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BoundValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BoundValue {}

impl Hash for BoundValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash by family plus a canonical value so that cross-variant equal
        // values (Integer(5) == Float(5.0), Date == midnight Timestamp) land
        // in the same bucket.
        match self.family() {
            BoundFamily::Numeric => {
                0u8.hash(state);
                self.as_f64_lossy().to_bits().hash(state);
            }
            BoundFamily::Temporal => {
                1u8.hash(state);
                if let Some(ts) = self.as_timestamp() {
                    ts.and_utc().timestamp_millis().hash(state);
                }
            }
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Integer(i) => write!(f, "{}", i),
            BoundValue::Float(v) => write!(f, "{}", v),
            BoundValue::Decimal(d) => write!(f, "{}", d),
            BoundValue::Date(d) => write!(f, "{}", d),
            BoundValue::Timestamp(ts) => write!(f, "{}", ts),
        }
    }
}

impl From<i64> for BoundValue {
    fn from(v: i64) -> Self {
        BoundValue::Integer(v)
    }
}

impl From<f64> for BoundValue {
    fn from(v: f64) -> Self {
        BoundValue::Float(v)
    }
}

impl From<Decimal> for BoundValue {
    fn from(v: Decimal) -> Self {
        BoundValue::Decimal(v)
    }
}

impl From<NaiveDate> for BoundValue {
    fn from(v: NaiveDate) -> Self {
        BoundValue::Date(v)
    }
}

impl From<NaiveDateTime> for BoundValue {
    fn from(v: NaiveDateTime) -> Self {
        BoundValue::Timestamp(v)
    }
}

/// Per-bound inclusivity of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Closure {
    /// Both bounds exclusive: `(start, stop)`
    Open,
    /// Both bounds inclusive: `[start, stop]`
    Closed,
    /// Inclusive start, exclusive stop: `[start, stop)`; the default
    #[default]
    ClosedOpen,
    /// Exclusive start, inclusive stop: `(start, stop]`
    OpenClosed,
}

impl Closure {
    /// Whether the start bound is inclusive.
    pub fn start_closed(&self) -> bool {
        matches!(self, Closure::Closed | Closure::ClosedOpen)
    }

    /// Whether the stop bound is inclusive.
    pub fn stop_closed(&self) -> bool {
        matches!(self, Closure::Closed | Closure::OpenClosed)
    }

    fn from_flags(start_closed: bool, stop_closed: bool) -> Self {
        match (start_closed, stop_closed) {
            (true, true) => Closure::Closed,
            (true, false) => Closure::ClosedOpen,
            (false, true) => Closure::OpenClosed,
            (false, false) => Closure::Open,
        }
    }
}

/// A validated range between two bound values.
///
/// Invariants, enforced at construction:
/// - start and stop belong to the same bound family
/// - neither bound is NaN
/// - `start <= stop`, with equality permitted only under [`Closure::Closed`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    start: BoundValue,
    stop: BoundValue,
    closure: Closure,
}

impl Interval {
    /// Construct a validated interval.
    pub fn new(
        start: impl Into<BoundValue>,
        stop: impl Into<BoundValue>,
        closure: Closure,
    ) -> SpanJoinResult<Self> {
        let start = start.into();
        let stop = stop.into();
        if start.is_nan() || stop.is_nan() {
            return Err(SpanJoinError::domain("interval bounds must not be NaN"));
        }
        if start.family() != stop.family() {
            return Err(SpanJoinError::domain(format!(
                "interval bounds are not comparable: {} vs {}",
                start.type_name(),
                stop.type_name()
            )));
        }
        match start.cmp(&stop) {
            Ordering::Greater => Err(SpanJoinError::domain(format!(
                "interval start {} is after stop {}",
                start, stop
            ))),
            Ordering::Equal if closure != Closure::Closed => Err(SpanJoinError::domain(format!(
                "empty interval at {} must be closed on both bounds",
                start
            ))),
            _ => Ok(Self {
                start,
                stop,
                closure,
            }),
        }
    }

    /// Construct a half-open interval `[start, stop)`.
    pub fn half_open(start: impl Into<BoundValue>, stop: impl Into<BoundValue>) -> SpanJoinResult<Self> {
        Self::new(start, stop, Closure::ClosedOpen)
    }

    /// Construct a closed interval `[start, stop]`.
    pub fn closed(start: impl Into<BoundValue>, stop: impl Into<BoundValue>) -> SpanJoinResult<Self> {
        Self::new(start, stop, Closure::Closed)
    }

    pub fn start(&self) -> &BoundValue {
        &self.start
    }

    pub fn stop(&self) -> &BoundValue {
        &self.stop
    }

    pub fn closure(&self) -> Closure {
        self.closure
    }

    pub(crate) fn family(&self) -> BoundFamily {
        self.start.family()
    }

    /// Whether `self.stop` lies strictly before `other.start` under the
    /// effective inclusivity of both bounds. When this holds, `self` is
    /// disjoint from `other` and from every interval starting later.
    pub(crate) fn stop_precedes_start_of(&self, other: &Interval) -> bool {
        match self.stop.cmp(&other.start) {
            Ordering::Less => true,
            Ordering::Equal => !(self.closure.stop_closed() && other.closure.start_closed()),
            Ordering::Greater => false,
        }
    }

    /// Whether two intervals overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.stop_precedes_start_of(other) && !other.stop_precedes_start_of(self)
    }

    /// The intersection of two overlapping intervals, or `None` when they are
    /// disjoint. The result takes the larger start and the smaller stop, with
    /// inclusivity from whichever bound is tighter.
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }
        let (start, start_closed) = match self.start.cmp(&other.start) {
            Ordering::Greater => (self.start.clone(), self.closure.start_closed()),
            Ordering::Less => (other.start.clone(), other.closure.start_closed()),
            Ordering::Equal => (
                self.start.clone(),
                self.closure.start_closed() && other.closure.start_closed(),
            ),
        };
        let (stop, stop_closed) = match self.stop.cmp(&other.stop) {
            Ordering::Less => (self.stop.clone(), self.closure.stop_closed()),
            Ordering::Greater => (other.stop.clone(), other.closure.stop_closed()),
            Ordering::Equal => (
                self.stop.clone(),
                self.closure.stop_closed() && other.closure.stop_closed(),
            ),
        };
        Some(Interval {
            start,
            stop,
            closure: Closure::from_flags(start_closed, stop_closed),
        })
    }

    /// The measure of this interval: numeric difference for numeric bounds,
    /// a time delta for temporal bounds.
    pub fn span_length(&self) -> SpanLength {
        use BoundValue::*;
        match (&self.start, &self.stop) {
            (Integer(a), Integer(b)) => SpanLength::Decimal(rust_decimal::Decimal::from(*b) - rust_decimal::Decimal::from(*a)),
            (Decimal(a), Decimal(b)) => SpanLength::Decimal(*b - *a),
            (Integer(a), Decimal(b)) => SpanLength::Decimal(*b - rust_decimal::Decimal::from(*a)),
            (Decimal(a), Integer(b)) => SpanLength::Decimal(rust_decimal::Decimal::from(*b) - *a),
            (a, b) if a.family() == BoundFamily::Numeric => {
                SpanLength::Numeric(b.as_f64_lossy() - a.as_f64_lossy())
            }
            (a, b) => {
                // Temporal family; promotion cannot fail after validation.
                let start = a.as_timestamp().unwrap_or_default();
                let stop = b.as_timestamp().unwrap_or_default();
                SpanLength::Time(stop.signed_duration_since(start))
            }
        }
    }
}

impl Hash for Interval {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.stop.hash(state);
        self.closure.hash(state);
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.closure.start_closed() { '[' } else { '(' };
        let close = if self.closure.stop_closed() { ']' } else { ')' };
        write!(f, "{}{}, {}{}", open, self.start, self.stop, close)
    }
}

/// An interval tagged with the row index it came from.
///
/// Produced once per row by the normalizer, consumed by the join core.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedInterval {
    /// Row index in the source table.
    pub row: usize,
    /// The canonical interval for that row.
    pub interval: Interval,
}

/// The measure of an interval, used by the window generator.
#[derive(Debug, Clone, Copy)]
pub enum SpanLength {
    /// Floating point difference
    Numeric(f64),
    /// Exact decimal difference (integer or decimal bounds)
    Decimal(Decimal),
    /// Time delta (date or timestamp bounds)
    Time(Duration),
}

impl SpanLength {
    /// `self * num / den`, for computing window boundaries and the default
    /// minimum duration without accumulation drift.
    pub(crate) fn scaled(&self, num: i64, den: i64) -> SpanLength {
        match self {
            SpanLength::Numeric(x) => SpanLength::Numeric(x * num as f64 / den as f64),
            SpanLength::Decimal(d) => {
                SpanLength::Decimal(*d * Decimal::from(num) / Decimal::from(den))
            }
            SpanLength::Time(t) => match t.num_nanoseconds() {
                Some(ns) => {
                    let scaled = (ns as i128 * num as i128 / den as i128) as i64;
                    SpanLength::Time(Duration::nanoseconds(scaled))
                }
                None => {
                    let ms = t.num_milliseconds() as i128 * num as i128 / den as i128;
                    SpanLength::Time(Duration::milliseconds(ms as i64))
                }
            },
        }
    }

    /// `self / n`.
    pub fn divided_by(&self, n: usize) -> SpanLength {
        self.scaled(1, n as i64)
    }

    pub fn is_positive(&self) -> bool {
        match self {
            SpanLength::Numeric(x) => *x > 0.0,
            SpanLength::Decimal(d) => d.is_sign_positive() && !d.is_zero(),
            SpanLength::Time(t) => *t > Duration::zero(),
        }
    }
}

impl PartialEq for SpanLength {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for SpanLength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        use SpanLength::*;
        match (self, other) {
            (Numeric(a), Numeric(b)) => Some(a.total_cmp(b)),
            (Decimal(a), Decimal(b)) => Some(a.cmp(b)),
            (Numeric(a), Decimal(b)) => b.to_f64().map(|bf| a.total_cmp(&bf)),
            (Decimal(a), Numeric(b)) => a.to_f64().map(|af| af.total_cmp(b)),
            (Time(a), Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for SpanLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanLength::Numeric(x) => write!(f, "{}", x),
            SpanLength::Decimal(d) => write!(f, "{}", d),
            SpanLength::Time(t) => write!(f, "{}", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_open(start: i64, stop: i64) -> Interval {
        Interval::half_open(start, stop).unwrap()
    }

    #[test]
    fn test_interval_validation() {
        assert!(Interval::half_open(0, 10).is_ok());
        assert!(Interval::half_open(10, 0).is_err());
        assert!(Interval::half_open(5, 5).is_err());
        assert!(Interval::closed(5, 5).is_ok());
        assert!(Interval::half_open(0.0, f64::NAN).is_err());
        let mixed = Interval::new(
            BoundValue::Integer(0),
            BoundValue::Timestamp(NaiveDateTime::default()),
            Closure::ClosedOpen,
        );
        assert!(mixed.is_err());
    }

    #[test]
    fn test_overlap_symmetry() {
        let cases = [
            (half_open(0, 10), half_open(5, 15)),
            (half_open(0, 10), half_open(10, 20)),
            (half_open(0, 5), half_open(5, 10)),
            (half_open(0, 3), half_open(7, 9)),
        ];
        for (a, b) in &cases {
            assert_eq!(a.overlaps(b), b.overlaps(a), "{} vs {}", a, b);
            assert_eq!(a.intersection(b), b.intersection(a), "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_half_open_adjacency_is_disjoint() {
        assert!(!half_open(0, 5).overlaps(&half_open(5, 10)));
    }

    #[test]
    fn test_closed_adjacency_touches() {
        let a = Interval::closed(0, 5).unwrap();
        let b = half_open(5, 10);
        assert!(a.overlaps(&b));
        let meet = a.intersection(&b).unwrap();
        assert_eq!(meet, Interval::closed(5, 5).unwrap());
    }

    #[test]
    fn test_intersection_bounds() {
        let meet = half_open(0, 10).intersection(&half_open(5, 15)).unwrap();
        assert_eq!(meet, half_open(5, 10));
    }

    #[test]
    fn test_tighter_bound_wins() {
        let a = Interval::new(0, 10, Closure::Open).unwrap();
        let b = Interval::closed(0, 10).unwrap();
        let meet = a.intersection(&b).unwrap();
        assert_eq!(meet.closure(), Closure::Open);
    }

    #[test]
    fn test_cross_variant_numeric_compare() {
        assert_eq!(BoundValue::Integer(5), BoundValue::Float(5.0));
        assert!(BoundValue::Integer(5) < BoundValue::Float(5.5));
        assert_eq!(BoundValue::Integer(2), BoundValue::Decimal(Decimal::from(2)));
    }

    #[test]
    fn test_temporal_compare() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let midnight = d.and_time(NaiveTime::MIN);
        assert_eq!(BoundValue::Date(d), BoundValue::Timestamp(midnight));
        assert!(BoundValue::Date(d) < BoundValue::Timestamp(midnight + Duration::seconds(1)));
    }

    #[test]
    fn test_span_length() {
        assert_eq!(
            half_open(0, 10).span_length(),
            SpanLength::Decimal(Decimal::from(10))
        );
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_time(NaiveTime::MIN);
        let iv = Interval::half_open(start, start + Duration::hours(2)).unwrap();
        assert_eq!(iv.span_length(), SpanLength::Time(Duration::hours(2)));
    }

    #[test]
    fn test_span_length_scaling() {
        let len = SpanLength::Time(Duration::hours(10));
        assert_eq!(len.divided_by(4), SpanLength::Time(Duration::minutes(150)));
        assert_eq!(
            SpanLength::Decimal(Decimal::from(10)).scaled(3, 4),
            SpanLength::Decimal(Decimal::new(75, 1))
        );
        assert!(SpanLength::Numeric(0.0) < SpanLength::Decimal(Decimal::ONE));
    }
}
