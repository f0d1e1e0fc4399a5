//! Table cell values.
//!
//! [`FieldValue`] is the dynamic cell type of the in-memory tables this
//! engine consumes and produces. It carries the scalar families the engine
//! needs (integers, floats, decimals, strings, booleans, dates, timestamps)
//! plus interval cells, and a SQL-style `Null` used for unmatched rows in
//! outer joins.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::spanjoin::interval::{BoundValue, Interval};

/// A value in a table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Null / missing value
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Date (YYYY-MM-DD)
    Date(NaiveDate),
    /// Timestamp (YYYY-MM-DD HH:MM:SS[.nnn])
    Timestamp(NaiveDateTime),
    /// Decimal value for precise arithmetic
    Decimal(Decimal),
    /// An interval between two bound values
    Interval(Interval),
}

impl FieldValue {
    /// Get the type name for error messages and debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "NULL",
            FieldValue::Integer(_) => "INTEGER",
            FieldValue::Float(_) => "FLOAT",
            FieldValue::String(_) => "STRING",
            FieldValue::Boolean(_) => "BOOLEAN",
            FieldValue::Date(_) => "DATE",
            FieldValue::Timestamp(_) => "TIMESTAMP",
            FieldValue::Decimal(_) => "DECIMAL",
            FieldValue::Interval(_) => "INTERVAL",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Check if this value represents a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldValue::Integer(_) | FieldValue::Float(_) | FieldValue::Decimal(_)
        )
    }

    /// View this cell as an interval, if it holds one.
    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            FieldValue::Interval(iv) => Some(iv),
            _ => None,
        }
    }

    /// Convert this cell to an interval bound value, if its family allows it.
    pub fn to_bound(&self) -> Option<BoundValue> {
        match self {
            FieldValue::Integer(i) => Some(BoundValue::Integer(*i)),
            FieldValue::Float(f) => Some(BoundValue::Float(*f)),
            FieldValue::Decimal(d) => Some(BoundValue::Decimal(*d)),
            FieldValue::Date(d) => Some(BoundValue::Date(*d)),
            FieldValue::Timestamp(ts) => Some(BoundValue::Timestamp(*ts)),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value` for interchange and debugging output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Value::from(*f),
            FieldValue::String(s) => serde_json::Value::from(s.clone()),
            FieldValue::Boolean(b) => serde_json::Value::from(*b),
            FieldValue::Date(d) => serde_json::Value::from(d.format("%Y-%m-%d").to_string()),
            FieldValue::Timestamp(ts) => {
                serde_json::Value::from(ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            }
            FieldValue::Decimal(d) => serde_json::Value::from(d.to_string()),
            FieldValue::Interval(iv) => serde_json::Value::from(iv.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::Interval(iv) => write!(f, "{}", iv),
        }
    }
}

/// Hash implementation so values can participate in group keys.
///
/// The discriminant is hashed first to distinguish variants; floats hash via
/// their bit representation, which handles NaN, infinity, and -0.0.
impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            FieldValue::Null => {}
            FieldValue::Integer(i) => i.hash(state),
            FieldValue::Float(f) => f.to_bits().hash(state),
            FieldValue::String(s) => s.hash(state),
            FieldValue::Boolean(b) => b.hash(state),
            FieldValue::Date(d) => {
                d.year().hash(state);
                d.month().hash(state);
                d.day().hash(state);
            }
            FieldValue::Timestamp(ts) => {
                ts.and_utc().timestamp_millis().hash(state);
            }
            FieldValue::Decimal(d) => {
                // Deterministic across equal values with different scales.
                d.normalize().to_string().hash(state);
            }
            FieldValue::Interval(iv) => iv.hash(state),
        }
    }
}

impl From<Interval> for FieldValue {
    fn from(iv: Interval) -> Self {
        FieldValue::Interval(iv)
    }
}

fn key_value_eq(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        // Bit equality so NaN keys group together instead of each forming
        // an unreachable singleton group.
        (FieldValue::Float(x), FieldValue::Float(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

/// An ordered tuple of column values identifying one group of a grouped join.
#[derive(Debug, Clone)]
pub struct GroupKey(Vec<FieldValue>);

impl GroupKey {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self(values)
    }

    /// The key's column values, in grouping-column order.
    pub fn values(&self) -> &[FieldValue] {
        &self.0
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        self.0
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| key_value_eq(a, b))
    }
}

impl Eq for GroupKey {}

impl Hash for GroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        for value in &self.0 {
            value.hash(state);
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ")")
    }
}

#[allow(dead_code)]
pub(crate) fn hash_of(value: &FieldValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spanjoin::interval::Interval;

    #[test]
    fn test_type_names() {
        assert_eq!(FieldValue::Null.type_name(), "NULL");
        assert_eq!(FieldValue::Integer(1).type_name(), "INTEGER");
        let iv = Interval::half_open(0, 10).unwrap();
        assert_eq!(FieldValue::Interval(iv).type_name(), "INTERVAL");
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Null.to_string(), "NULL");
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        let iv = Interval::half_open(0, 10).unwrap();
        assert_eq!(FieldValue::Interval(iv).to_string(), "[0, 10)");
    }

    #[test]
    fn test_group_key_float_bits() {
        let a = GroupKey::new(vec![FieldValue::Float(f64::NAN)]);
        let b = GroupKey::new(vec![FieldValue::Float(f64::NAN)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a.values()[0]), hash_of(&b.values()[0]));
    }

    #[test]
    fn test_group_key_distinguishes_variants() {
        let a = GroupKey::new(vec![FieldValue::Integer(1)]);
        let b = GroupKey::new(vec![FieldValue::String("1".to_string())]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(FieldValue::Integer(3).to_json(), serde_json::json!(3));
        assert_eq!(FieldValue::Null.to_json(), serde_json::Value::Null);
        let iv = Interval::half_open(0, 5).unwrap();
        assert_eq!(
            FieldValue::Interval(iv).to_json(),
            serde_json::json!("[0, 5)")
        );
    }
}
