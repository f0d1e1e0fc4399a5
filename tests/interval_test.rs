//! Property-style tests for interval algebra and value serialization.

use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use spanjoin::{BoundValue, Closure, FieldValue, Interval, Table};

fn numeric_intervals() -> Vec<Interval> {
    vec![
        Interval::half_open(0, 10).unwrap(),
        Interval::half_open(5, 15).unwrap(),
        Interval::closed(10, 10).unwrap(),
        Interval::new(0, 10, Closure::Open).unwrap(),
        Interval::new(10, 20, Closure::OpenClosed).unwrap(),
        Interval::half_open(2.5, 7.5).unwrap(),
        Interval::closed(Decimal::new(25, 1), Decimal::new(125, 1)).unwrap(),
    ]
}

#[test]
fn test_overlap_and_intersection_symmetry() {
    let intervals = numeric_intervals();
    for a in &intervals {
        for b in &intervals {
            assert_eq!(a.overlaps(b), b.overlaps(a), "{} vs {}", a, b);
            assert_eq!(a.intersection(b), b.intersection(a), "{} vs {}", a, b);
        }
    }
}

#[test]
fn test_intersection_is_contained_in_both() {
    let intervals = numeric_intervals();
    for a in &intervals {
        for b in &intervals {
            if let Some(meet) = a.intersection(b) {
                assert!(meet.start() >= a.start() && meet.start() >= b.start());
                assert!(meet.stop() <= a.stop() && meet.stop() <= b.stop());
            }
        }
    }
}

#[test]
fn test_self_intersection_is_identity() {
    for iv in numeric_intervals() {
        assert_eq!(iv.intersection(&iv), Some(iv.clone()));
    }
}

#[test]
fn test_disjoint_iff_no_intersection() {
    let intervals = numeric_intervals();
    for a in &intervals {
        for b in &intervals {
            assert_eq!(a.overlaps(b), a.intersection(b).is_some());
        }
    }
}

#[test]
fn test_temporal_interval_roundtrip() {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_time(NaiveTime::MIN);
    let iv = Interval::half_open(start, start + Duration::minutes(90)).unwrap();

    let json = serde_json::to_string(&iv).unwrap();
    let back: Interval = serde_json::from_str(&json).unwrap();
    assert_eq!(iv, back);
}

#[test]
fn test_table_serde_roundtrip() {
    let table = Table::from_columns(vec![
        (
            "span",
            vec![FieldValue::Interval(Interval::half_open(0, 10).unwrap())],
        ),
        ("weight", vec![FieldValue::Float(0.5)]),
        ("note", vec![FieldValue::Null]),
    ])
    .unwrap();

    let json = serde_json::to_string(&table).unwrap();
    let back: Table = serde_json::from_str(&json).unwrap();
    assert_eq!(table, back);
}

#[test]
fn test_bound_value_ordering_is_total_within_family() {
    let values = vec![
        BoundValue::Integer(-3),
        BoundValue::Float(-2.5),
        BoundValue::Decimal(Decimal::ZERO),
        BoundValue::Integer(1),
        BoundValue::Float(1.5),
        BoundValue::Decimal(Decimal::from(7)),
    ];
    let mut sorted = values.clone();
    sorted.sort();
    assert_eq!(sorted, values);
}
