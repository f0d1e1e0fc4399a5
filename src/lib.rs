//! # spanjoin
//!
//! An interval-join engine for in-memory columnar tables: pairs up the rows
//! of two tables whose intervals overlap, materializes the overlap, and
//! supports grouped and aggregated variants without building the full cross
//! product.
//!
//! ## Features
//!
//! - **Overlap joins**: one output row per overlapping pair, carrying both
//!   rows' columns and the intersection interval, with configurable renaming
//!   and collision handling and optional outer-join retention
//! - **Sweep-line core**: both sides sorted once, matched through bounded
//!   active sets instead of a quadratic pairwise scan
//! - **Grouped joins**: partition-once views exposing per-group iteration
//!   and aggregation without materializing the full joined table
//! - **Quantile windows**: divide a span into `n` equal sub-intervals,
//!   drift-free, for bucketing joins
//!
//! ## Quick start
//!
//! ```rust
//! use spanjoin::{interval_join, FieldValue, Interval, JoinOptions, OnSpec, Table};
//!
//! let left = Table::from_columns(vec![
//!     ("id", vec![FieldValue::Integer(1)]),
//!     ("span", vec![FieldValue::Interval(Interval::half_open(0, 10).unwrap())]),
//! ])
//! .unwrap();
//! let right = Table::from_columns(vec![
//!     ("id", vec![FieldValue::Integer(10), FieldValue::Integer(11)]),
//!     ("span", vec![
//!         FieldValue::Interval(Interval::half_open(5, 15).unwrap()),
//!         FieldValue::Interval(Interval::half_open(20, 30).unwrap()),
//!     ]),
//! ])
//! .unwrap();
//!
//! let options = JoinOptions::on(OnSpec::shared("span")).with_makeunique(true);
//! let joined = interval_join(&left, &right, &options).unwrap();
//!
//! // One row: only the [0, 10) x [5, 15) pairing overlaps.
//! assert_eq!(joined.row_count(), 1);
//! assert_eq!(
//!     joined.column("span").unwrap()[0],
//!     FieldValue::Interval(Interval::half_open(5, 10).unwrap())
//! );
//! ```

pub mod spanjoin;

pub use crate::spanjoin::{
    groupby_interval_join, interval_join, quantile_windows, BoundValue, Closure, FieldValue,
    GroupIter, GroupKey, GroupSpec, GroupedJoinView, Interval, IntervalLike, IntervalTransform,
    JoinOptions, LabelSpec, OnSpec, RenamePair, Renamer, SideSpec, SpanJoinError, SpanJoinResult,
    SpanLength, SpanSource, Table, TaggedInterval, WindowOptions,
};
