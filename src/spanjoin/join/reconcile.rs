//! Output schema construction and row materialization.
//!
//! The reconciler merges the two input schemas into the output schema:
//! non-join columns renamed per a configurable rule, the per-side on
//! columns renamed per a separate rule, collisions either rejected or
//! deduplicated with integer suffixes, and the intersection written to a
//! configurably named overlap column. It also completes outer joins by
//! appending null-filled rows for unmatched inputs.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::spanjoin::error::{SpanJoinError, SpanJoinResult};
use crate::spanjoin::interval::TaggedInterval;
use crate::spanjoin::join::spec::SideSpec;
use crate::spanjoin::join::sweep::MatchPair;
use crate::spanjoin::join::JoinOptions;
use crate::spanjoin::table::{FieldValue, Table};

/// A column rename rule.
#[derive(Clone, Default)]
pub enum Renamer {
    /// Keep the name unchanged.
    #[default]
    Identity,
    /// Append a suffix to the name.
    Suffix(String),
    /// Apply an arbitrary function to the name.
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl Renamer {
    /// Create a suffixing renamer.
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Renamer::Suffix(suffix.into())
    }

    /// Create a renamer from a function over the column name.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Renamer::Custom(Arc::new(f))
    }

    /// Apply the rule to a column name.
    pub fn apply(&self, name: &str) -> String {
        match self {
            Renamer::Identity => name.to_string(),
            Renamer::Suffix(suffix) => format!("{}{}", name, suffix),
            Renamer::Custom(f) => f.as_ref()(name),
        }
    }
}

impl fmt::Debug for Renamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renamer::Identity => write!(f, "Identity"),
            Renamer::Suffix(s) => f.debug_tuple("Suffix").field(s).finish(),
            Renamer::Custom(_) => write!(f, "Custom(<fn>)"),
        }
    }
}

/// A left/right pair of rename rules.
#[derive(Debug, Clone, Default)]
pub struct RenamePair {
    pub left: Renamer,
    pub right: Renamer,
}

impl RenamePair {
    pub fn new(left: Renamer, right: Renamer) -> Self {
        Self { left, right }
    }

    /// Suffix both sides, e.g. `RenamePair::suffixes("_left", "_right")`.
    pub fn suffixes(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: Renamer::suffix(left),
            right: Renamer::suffix(right),
        }
    }
}

/// Where an output column's values come from.
#[derive(Debug, Clone, PartialEq)]
enum ColumnSource {
    /// A non-join column of the left table.
    Left(String),
    /// A non-join column of the right table.
    Right(String),
    /// The left side's normalized interval.
    LeftOn,
    /// The right side's normalized interval.
    RightOn,
    /// The intersection of the pair's intervals.
    Overlap,
}

/// One column of the output schema.
#[derive(Debug, Clone)]
pub(crate) struct OutputColumn {
    name: String,
    source: ColumnSource,
}

/// Build the output schema: left columns in source order (the on column
/// renamed via `renameon`, others via `renamecols`), then right columns
/// likewise, then the overlap column. Collisions are resolved here, before
/// any row exists.
pub(crate) fn build_schema(
    left: &Table,
    right: &Table,
    left_spec: &SideSpec,
    right_spec: &SideSpec,
    options: &JoinOptions,
) -> SpanJoinResult<Vec<OutputColumn>> {
    let mut columns = Vec::new();

    side_columns(
        left,
        left_spec,
        &options.renamecols.left,
        &options.renameon.left,
        ColumnSource::LeftOn,
        &mut columns,
    );
    side_columns(
        right,
        right_spec,
        &options.renamecols.right,
        &options.renameon.right,
        ColumnSource::RightOn,
        &mut columns,
    );

    let outcol = options
        .outcol
        .clone()
        .unwrap_or_else(|| left_spec.base_name().to_string());
    columns.push(OutputColumn {
        name: outcol,
        source: ColumnSource::Overlap,
    });

    make_unique(&mut columns, options.makeunique)?;
    Ok(columns)
}

fn side_columns(
    table: &Table,
    spec: &SideSpec,
    renamecols: &Renamer,
    renameon: &Renamer,
    on_source: ColumnSource,
    out: &mut Vec<OutputColumn>,
) {
    let is_left = on_source == ColumnSource::LeftOn;
    let non_join_source = |name: &str| {
        if is_left {
            ColumnSource::Left(name.to_string())
        } else {
            ColumnSource::Right(name.to_string())
        }
    };
    for name in table.column_names() {
        if spec.on_column() == Some(name) {
            out.push(OutputColumn {
                name: renameon.apply(name),
                source: on_source.clone(),
            });
        } else {
            out.push(OutputColumn {
                name: renamecols.apply(name),
                source: non_join_source(name),
            });
        }
    }
    // Transform specs have no single source column; their normalized
    // interval still surfaces as this side's on column, appended after the
    // side's own columns.
    if spec.on_column().is_none() {
        out.push(OutputColumn {
            name: renameon.apply(spec.base_name()),
            source: on_source,
        });
    }
}

fn make_unique(columns: &mut [OutputColumn], makeunique: bool) -> SpanJoinResult<()> {
    let mut seen: HashSet<String> = HashSet::new();
    for column in columns.iter_mut() {
        if seen.contains(&column.name) {
            if !makeunique {
                return Err(SpanJoinError::name_collision(column.name.clone()));
            }
            let mut i = 1usize;
            let mut candidate = format!("{}_{}", column.name, i);
            while seen.contains(&candidate) {
                i += 1;
                candidate = format!("{}_{}", column.name, i);
            }
            column.name = candidate;
        }
        seen.insert(column.name.clone());
    }
    Ok(())
}

/// Materialize the output table: one row per matched pair (in pair order),
/// then one null-completed row per retained unmatched left row, then per
/// retained unmatched right row.
pub(crate) fn materialize(
    schema: &[OutputColumn],
    left: &Table,
    right: &Table,
    left_norm: &[TaggedInterval],
    right_norm: &[TaggedInterval],
    pairs: &[MatchPair],
    keep_left: &[usize],
    keep_right: &[usize],
) -> SpanJoinResult<Table> {
    let total = pairs.len() + keep_left.len() + keep_right.len();
    let mut out = Vec::with_capacity(schema.len());

    for column in schema {
        let mut values: Vec<FieldValue> = Vec::with_capacity(total);
        match &column.source {
            ColumnSource::Left(name) => {
                let cells = left.require_column(name)?;
                values.extend(pairs.iter().map(|p| cells[p.left_row].clone()));
                values.extend(keep_left.iter().map(|&row| cells[row].clone()));
                values.extend(keep_right.iter().map(|_| FieldValue::Null));
            }
            ColumnSource::Right(name) => {
                let cells = right.require_column(name)?;
                values.extend(pairs.iter().map(|p| cells[p.right_row].clone()));
                values.extend(keep_left.iter().map(|_| FieldValue::Null));
                values.extend(keep_right.iter().map(|&row| cells[row].clone()));
            }
            ColumnSource::LeftOn => {
                values.extend(
                    pairs
                        .iter()
                        .map(|p| FieldValue::Interval(left_norm[p.left_row].interval.clone())),
                );
                values.extend(
                    keep_left
                        .iter()
                        .map(|&row| FieldValue::Interval(left_norm[row].interval.clone())),
                );
                values.extend(keep_right.iter().map(|_| FieldValue::Null));
            }
            ColumnSource::RightOn => {
                values.extend(
                    pairs
                        .iter()
                        .map(|p| FieldValue::Interval(right_norm[p.right_row].interval.clone())),
                );
                values.extend(keep_left.iter().map(|_| FieldValue::Null));
                values.extend(
                    keep_right
                        .iter()
                        .map(|&row| FieldValue::Interval(right_norm[row].interval.clone())),
                );
            }
            ColumnSource::Overlap => {
                values.extend(
                    pairs
                        .iter()
                        .map(|p| FieldValue::Interval(p.overlap.clone())),
                );
                values.extend(keep_left.iter().map(|_| FieldValue::Null));
                values.extend(keep_right.iter().map(|_| FieldValue::Null));
            }
        }
        out.push((column.name.clone(), values));
    }

    Table::from_columns(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renamer_apply() {
        assert_eq!(Renamer::Identity.apply("x"), "x");
        assert_eq!(Renamer::suffix("_l").apply("x"), "x_l");
        let upper = Renamer::custom(|name: &str| name.to_uppercase());
        assert_eq!(upper.apply("x"), "X");
    }

    #[test]
    fn test_make_unique_suffixing() {
        let mut columns = vec![
            OutputColumn {
                name: "x".to_string(),
                source: ColumnSource::Left("x".to_string()),
            },
            OutputColumn {
                name: "x".to_string(),
                source: ColumnSource::Right("x".to_string()),
            },
            OutputColumn {
                name: "x".to_string(),
                source: ColumnSource::Overlap,
            },
        ];
        make_unique(&mut columns, true).unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "x_1", "x_2"]);
    }

    #[test]
    fn test_make_unique_rejects_without_flag() {
        let mut columns = vec![
            OutputColumn {
                name: "x".to_string(),
                source: ColumnSource::Left("x".to_string()),
            },
            OutputColumn {
                name: "x".to_string(),
                source: ColumnSource::Right("x".to_string()),
            },
        ];
        let err = make_unique(&mut columns, false).unwrap_err();
        assert_eq!(err, SpanJoinError::name_collision("x"));
    }

    #[test]
    fn test_make_unique_skips_taken_suffix() {
        // A pre-existing "x_1" forces the second "x" to become "x_2".
        let mut columns = vec![
            OutputColumn {
                name: "x".to_string(),
                source: ColumnSource::Left("x".to_string()),
            },
            OutputColumn {
                name: "x_1".to_string(),
                source: ColumnSource::Left("x_1".to_string()),
            },
            OutputColumn {
                name: "x".to_string(),
                source: ColumnSource::Right("x".to_string()),
            },
        ];
        make_unique(&mut columns, true).unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "x_1", "x_2"]);
    }
}
