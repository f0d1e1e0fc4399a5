//! Grouped interval join.
//!
//! A non-materializing alternative to joining first and grouping the
//! result: row-index partitions are computed once per side, the join runs
//! per group, and pairs across differing group keys are never computed at
//! all. The view supports exactly two operations, iteration and
//! aggregation; it is intentionally narrower than a materialized grouped
//! table.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::debug;

use crate::spanjoin::error::{SpanJoinError, SpanJoinResult};
use crate::spanjoin::interval::TaggedInterval;
use crate::spanjoin::join::reconcile::{self, OutputColumn};
use crate::spanjoin::join::spec;
use crate::spanjoin::join::sweep;
use crate::spanjoin::join::JoinOptions;
use crate::spanjoin::table::{FieldValue, GroupKey, Table};

/// Which columns define the group keys.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupSpec {
    /// Column names present in both tables; each side's keys are drawn from
    /// its own copy of the columns.
    Shared(Vec<String>),
    /// Explicit per-side column name lists of equal length.
    PerSide {
        left: Vec<String>,
        right: Vec<String>,
    },
}

impl GroupSpec {
    /// Group on columns shared by both tables.
    pub fn shared(names: Vec<impl Into<String>>) -> Self {
        GroupSpec::Shared(names.into_iter().map(Into::into).collect())
    }

    /// Group on per-side column lists, matched positionally.
    pub fn per_side(left: Vec<impl Into<String>>, right: Vec<impl Into<String>>) -> Self {
        GroupSpec::PerSide {
            left: left.into_iter().map(Into::into).collect(),
            right: right.into_iter().map(Into::into).collect(),
        }
    }

    fn resolve(self) -> SpanJoinResult<(Vec<String>, Vec<String>)> {
        let (left, right) = match self {
            GroupSpec::Shared(names) => (names.clone(), names),
            GroupSpec::PerSide { left, right } => (left, right),
        };
        if left.is_empty() {
            return Err(SpanJoinError::specification(
                "grouped join requires at least one grouping column",
            ));
        }
        if left.len() != right.len() {
            return Err(SpanJoinError::specification(format!(
                "per-side grouping column lists differ in length: {} vs {}",
                left.len(),
                right.len()
            )));
        }
        Ok((left, right))
    }
}

/// One group key per row, in row order.
fn row_keys(table: &Table, names: &[String]) -> SpanJoinResult<Vec<GroupKey>> {
    let columns: Vec<&[FieldValue]> = names
        .iter()
        .map(|name| table.require_column(name))
        .collect::<SpanJoinResult<_>>()?;
    Ok((0..table.row_count())
        .map(|row| GroupKey::new(columns.iter().map(|col| col[row].clone()).collect()))
        .collect())
}

/// A lazily consumable grouped join.
///
/// Holds the precomputed row-index partitions plus borrowed references to
/// the two source tables; the view does not outlive its sources and never
/// mutates them.
#[derive(Debug)]
pub struct GroupedJoinView<'a> {
    left: &'a Table,
    right: &'a Table,
    left_norm: Vec<TaggedInterval>,
    right_norm: Vec<TaggedInterval>,
    schema: Vec<OutputColumn>,
    key_names: Vec<String>,
    /// Group keys in first-appearance order, left rows before right rows.
    keys: Vec<GroupKey>,
    /// Per key: (left row indices, right row indices), each ascending.
    groups: HashMap<GroupKey, (Vec<usize>, Vec<usize>)>,
}

/// Construct a grouped interval join view.
///
/// Partitions both sides by group key and validates the output schema once;
/// iterating or aggregating the view afterwards cannot fail on schema
/// grounds. The retention flags of `options` do not apply here: each
/// group's sub-table uses inner-join semantics.
pub fn groupby_interval_join<'a>(
    left: &'a Table,
    right: &'a Table,
    groups: GroupSpec,
    options: &JoinOptions,
) -> SpanJoinResult<GroupedJoinView<'a>> {
    let (left_names, right_names) = groups.resolve()?;
    let (left_spec, right_spec) = options.on.resolve()?;

    let left_norm = spec::normalize(left, &left_spec)?;
    let right_norm = spec::normalize(right, &right_spec)?;
    spec::check_families(&left_norm, &right_norm)?;

    let schema = reconcile::build_schema(left, right, &left_spec, &right_spec, options)?;

    let mut keys: Vec<GroupKey> = Vec::new();
    let mut partitions: HashMap<GroupKey, (Vec<usize>, Vec<usize>)> = HashMap::new();
    for (row, key) in row_keys(left, &left_names)?.into_iter().enumerate() {
        match partitions.entry(key) {
            Entry::Occupied(mut entry) => entry.get_mut().0.push(row),
            Entry::Vacant(entry) => {
                keys.push(entry.key().clone());
                entry.insert((vec![row], Vec::new()));
            }
        }
    }
    for (row, key) in row_keys(right, &right_names)?.into_iter().enumerate() {
        match partitions.entry(key) {
            Entry::Occupied(mut entry) => entry.get_mut().1.push(row),
            Entry::Vacant(entry) => {
                keys.push(entry.key().clone());
                entry.insert((Vec::new(), vec![row]));
            }
        }
    }

    debug!(
        "grouped interval join: {} x {} rows across {} groups",
        left.row_count(),
        right.row_count(),
        keys.len()
    );

    Ok(GroupedJoinView {
        left,
        right,
        left_norm,
        right_norm,
        schema,
        key_names: left_names,
        keys,
        groups: partitions,
    })
}

impl<'a> GroupedJoinView<'a> {
    /// Number of groups (keys present in either side).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The grouping column names used for output key columns.
    pub fn key_names(&self) -> &[String] {
        &self.key_names
    }

    /// The group keys, in first-appearance order.
    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    /// Materialize one group's joined sub-table.
    fn group_table(&self, key: &GroupKey) -> SpanJoinResult<Table> {
        let (left_rows, right_rows) = self.groups.get(key).ok_or_else(|| {
            SpanJoinError::specification(format!("unknown group key {}", key))
        })?;
        let left_subset: Vec<TaggedInterval> = left_rows
            .iter()
            .map(|&row| self.left_norm[row].clone())
            .collect();
        let right_subset: Vec<TaggedInterval> = right_rows
            .iter()
            .map(|&row| self.right_norm[row].clone())
            .collect();
        let pairs = sweep::sweep_join(&left_subset, &right_subset);
        reconcile::materialize(
            &self.schema,
            self.left,
            self.right,
            &self.left_norm,
            &self.right_norm,
            &pairs,
            &[],
            &[],
        )
    }

    /// Lazily iterate the groups, yielding each key with its joined
    /// sub-table. Groups present on only one side yield empty sub-tables.
    pub fn iterate(&self) -> GroupIter<'_, 'a> {
        GroupIter {
            view: self,
            next: 0,
        }
    }

    /// Apply an aggregator to each group's sub-table and bind one output row
    /// per group: the grouping key columns followed by the aggregator's
    /// fields. Aggregator field names must agree across groups.
    pub fn combine<F>(&self, aggregator: F) -> SpanJoinResult<Table>
    where
        F: Fn(&Table) -> SpanJoinResult<Vec<(String, FieldValue)>>,
    {
        let mut key_columns: Vec<Vec<FieldValue>> =
            vec![Vec::with_capacity(self.keys.len()); self.key_names.len()];
        let mut agg_names: Option<Vec<String>> = None;
        let mut agg_columns: Vec<Vec<FieldValue>> = Vec::new();

        for entry in self.iterate() {
            let (key, table) = entry?;
            let fields = aggregator(&table)?;
            match &agg_names {
                None => {
                    agg_names = Some(fields.iter().map(|(name, _)| name.clone()).collect());
                    agg_columns = vec![Vec::with_capacity(self.keys.len()); fields.len()];
                }
                Some(names) => {
                    let got: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
                    if got != names.iter().map(String::as_str).collect::<Vec<_>>() {
                        return Err(SpanJoinError::specification(format!(
                            "aggregator returned fields {:?} for group {}, expected {:?}",
                            got, key, names
                        )));
                    }
                }
            }
            for (column, value) in key_columns.iter_mut().zip(key.into_values()) {
                column.push(value);
            }
            for (column, (_, value)) in agg_columns.iter_mut().zip(fields) {
                column.push(value);
            }
        }

        let mut out: Vec<(String, Vec<FieldValue>)> = self
            .key_names
            .iter()
            .cloned()
            .zip(key_columns)
            .collect();
        if let Some(names) = agg_names {
            out.extend(names.into_iter().zip(agg_columns));
        }
        Table::from_columns(out)
    }
}

/// Iterator over a grouped join view's groups.
pub struct GroupIter<'v, 'a> {
    view: &'v GroupedJoinView<'a>,
    next: usize,
}

impl<'v, 'a> Iterator for GroupIter<'v, 'a> {
    type Item = SpanJoinResult<(GroupKey, Table)>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.view.keys.get(self.next)?.clone();
        self.next += 1;
        Some(self.view.group_table(&key).map(|table| (key, table)))
    }
}
