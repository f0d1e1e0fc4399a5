//! Interval-join engine over in-memory columnar tables.

pub mod error;
pub mod interval;
pub mod join;
pub mod table;
pub mod window;

pub use error::{SpanJoinError, SpanJoinResult};
pub use interval::{BoundValue, Closure, Interval, SpanLength, TaggedInterval};
pub use join::{
    groupby_interval_join, interval_join, GroupIter, GroupSpec, GroupedJoinView, IntervalLike,
    IntervalTransform, JoinOptions, OnSpec, RenamePair, Renamer, SideSpec,
};
pub use table::{FieldValue, GroupKey, Table};
pub use window::{quantile_windows, LabelSpec, SpanSource, WindowOptions};
