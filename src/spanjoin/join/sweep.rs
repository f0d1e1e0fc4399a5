//! Sweep-line join core.
//!
//! Given two tagged-interval sequences, produce every overlapping pair with
//! its intersection, each pair exactly once. Both sides are sorted by start
//! (stable, ties broken by row index) and scanned in a single forward merge.
//! Each side keeps an active set ordered by stop in a min-heap; before an
//! element is probed against the opposite active set, every opposite
//! interval whose stop precedes the probe's start is evicted, since it can
//! no longer overlap this or any later-starting element. A pair is emitted
//! when its later-starting member is processed, so nothing is emitted twice.
//!
//! Complexity is O((|L|+|R|) log(|L|+|R|) + k log k) for k output pairs;
//! the active sets are bounded by the maximum number of simultaneously open
//! intervals, never by |L|·|R|.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::spanjoin::interval::{BoundValue, Interval, TaggedInterval};

/// One overlapping pair produced by the join core.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MatchPair {
    /// Row index in the left source table.
    pub left_row: usize,
    /// Row index in the right source table.
    pub right_row: usize,
    /// Intersection of the two intervals.
    pub overlap: Interval,
}

/// Active-set entry: an interval currently able to overlap future probes,
/// keyed by its stop bound. Among equal stops, open stops order first so
/// eviction can stop at the first surviving entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Active {
    stop: BoundValue,
    stop_closed: bool,
    pos: usize,
}

fn evict(heap: &mut BinaryHeap<Reverse<Active>>, probe: &Interval) {
    while let Some(Reverse(top)) = heap.peek() {
        let gone = match top.stop.cmp(probe.start()) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Equal => {
                !(top.stop_closed && probe.closure().start_closed())
            }
            std::cmp::Ordering::Greater => false,
        };
        if gone {
            heap.pop();
        } else {
            break;
        }
    }
}

fn sorted_order(side: &[TaggedInterval]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..side.len()).collect();
    order.sort_by(|&a, &b| {
        side[a]
            .interval
            .start()
            .cmp(side[b].interval.start())
            .then_with(|| side[a].row.cmp(&side[b].row))
    });
    order
}

struct Emitted {
    left_pos: usize,
    right_pos: usize,
    pair: MatchPair,
}

/// Compute every overlapping `(left, right)` pair with its intersection.
///
/// Output is ordered by the left interval's sorted position, then by the
/// right interval's sorted position within each left interval's matches.
pub(crate) fn sweep_join(left: &[TaggedInterval], right: &[TaggedInterval]) -> Vec<MatchPair> {
    let left_order = sorted_order(left);
    let right_order = sorted_order(right);

    let mut active_left: BinaryHeap<Reverse<Active>> = BinaryHeap::new();
    let mut active_right: BinaryHeap<Reverse<Active>> = BinaryHeap::new();
    let mut emitted: Vec<Emitted> = Vec::new();

    let (mut li, mut ri) = (0usize, 0usize);
    while li < left_order.len() || ri < right_order.len() {
        let take_left = match (left_order.get(li), right_order.get(ri)) {
            (Some(&l), Some(&r)) => {
                left[l].interval.start() <= right[r].interval.start()
            }
            (Some(_), None) => true,
            _ => false,
        };

        if take_left {
            let pos = li;
            let probe = &left[left_order[pos]];
            evict(&mut active_right, &probe.interval);
            for Reverse(active) in active_right.iter() {
                let candidate = &right[right_order[active.pos]];
                if let Some(overlap) = probe.interval.intersection(&candidate.interval) {
                    emitted.push(Emitted {
                        left_pos: pos,
                        right_pos: active.pos,
                        pair: MatchPair {
                            left_row: probe.row,
                            right_row: candidate.row,
                            overlap,
                        },
                    });
                }
            }
            active_left.push(Reverse(Active {
                stop: probe.interval.stop().clone(),
                stop_closed: probe.interval.closure().stop_closed(),
                pos,
            }));
            li += 1;
        } else {
            let pos = ri;
            let probe = &right[right_order[pos]];
            evict(&mut active_left, &probe.interval);
            for Reverse(active) in active_left.iter() {
                let candidate = &left[left_order[active.pos]];
                if let Some(overlap) = candidate.interval.intersection(&probe.interval) {
                    emitted.push(Emitted {
                        left_pos: active.pos,
                        right_pos: pos,
                        pair: MatchPair {
                            left_row: candidate.row,
                            right_row: probe.row,
                            overlap,
                        },
                    });
                }
            }
            active_right.push(Reverse(Active {
                stop: probe.interval.stop().clone(),
                stop_closed: probe.interval.closure().stop_closed(),
                pos,
            }));
            ri += 1;
        }
    }

    emitted.sort_by(|a, b| {
        a.left_pos
            .cmp(&b.left_pos)
            .then_with(|| a.right_pos.cmp(&b.right_pos))
    });
    emitted.into_iter().map(|e| e.pair).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spanjoin::interval::Closure;

    fn tagged(spans: &[(i64, i64)]) -> Vec<TaggedInterval> {
        spans
            .iter()
            .enumerate()
            .map(|(row, &(a, b))| TaggedInterval {
                row,
                interval: Interval::half_open(a, b).unwrap(),
            })
            .collect()
    }

    fn pairs(result: &[MatchPair]) -> Vec<(usize, usize)> {
        result.iter().map(|p| (p.left_row, p.right_row)).collect()
    }

    #[test]
    fn test_basic_overlap() {
        let left = tagged(&[(0, 10)]);
        let right = tagged(&[(5, 15), (20, 30)]);
        let result = sweep_join(&left, &right);
        assert_eq!(pairs(&result), vec![(0, 0)]);
        assert_eq!(result[0].overlap, Interval::half_open(5, 10).unwrap());
    }

    #[test]
    fn test_empty_sides() {
        let some = tagged(&[(0, 10)]);
        assert!(sweep_join(&[], &some).is_empty());
        assert!(sweep_join(&some, &[]).is_empty());
        assert!(sweep_join(&[], &[]).is_empty());
    }

    #[test]
    fn test_no_adjacent_rank_assumption() {
        // One long left interval overlapping every right interval, plus a
        // short one overlapping only the middle: overlap is not confined to
        // adjacent ranks in start order.
        let left = tagged(&[(0, 100), (40, 45)]);
        let right = tagged(&[(10, 20), (41, 44), (90, 95)]);
        let result = sweep_join(&left, &right);
        assert_eq!(pairs(&result), vec![(0, 0), (0, 1), (0, 2), (1, 1)]);
    }

    #[test]
    fn test_unsorted_inputs() {
        let mut left = tagged(&[(50, 60), (0, 10)]);
        left[0].row = 0;
        left[1].row = 1;
        let right = tagged(&[(5, 55)]);
        let result = sweep_join(&left, &right);
        // Ordered by sorted (start) position: [0,10) probes first.
        assert_eq!(pairs(&result), vec![(1, 0), (0, 0)]);
    }

    #[test]
    fn test_exactly_once_on_equal_starts() {
        let left = tagged(&[(0, 10)]);
        let right = tagged(&[(0, 10)]);
        let result = sweep_join(&left, &right);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_zero_duration_closed_interval() {
        let left = vec![TaggedInterval {
            row: 0,
            interval: Interval::closed(5, 5).unwrap(),
        }];
        let right = tagged(&[(0, 10), (6, 8)]);
        let result = sweep_join(&left, &right);
        assert_eq!(pairs(&result), vec![(0, 0)]);
        assert_eq!(result[0].overlap, Interval::closed(5, 5).unwrap());
    }

    #[test]
    fn test_open_bounds_respected() {
        let left = vec![TaggedInterval {
            row: 0,
            interval: Interval::new(0, 5, Closure::Closed).unwrap(),
        }];
        let touching = vec![TaggedInterval {
            row: 0,
            interval: Interval::new(5, 9, Closure::OpenClosed).unwrap(),
        }];
        assert!(sweep_join(&left, &touching).is_empty());

        let closed_touch = vec![TaggedInterval {
            row: 0,
            interval: Interval::new(5, 9, Closure::Closed).unwrap(),
        }];
        assert_eq!(sweep_join(&left, &closed_touch).len(), 1);
    }

    #[test]
    fn test_deterministic_ordering() {
        let left = tagged(&[(0, 30), (5, 25)]);
        let right = tagged(&[(1, 2), (6, 7), (26, 27)]);
        let a = sweep_join(&left, &right);
        let b = sweep_join(&left, &right);
        assert_eq!(a, b);
        assert_eq!(pairs(&a), vec![(0, 0), (0, 1), (0, 2), (1, 1)]);
    }

    #[test]
    fn test_dense_overlap_count() {
        // Every pair overlaps: 4 x 3 = 12 emitted pairs.
        let left = tagged(&[(0, 100), (1, 99), (2, 98), (3, 97)]);
        let right = tagged(&[(10, 90), (20, 80), (30, 70)]);
        assert_eq!(sweep_join(&left, &right).len(), 12);
    }
}
