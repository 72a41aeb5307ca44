use bytemuck::{Pod, Zeroable};
use itertools::Itertools;

use crate::error::{Error, Result};

/// A contiguous, inclusive range of samples `[first, last]`, together with
/// the timestamps `[start, stop]` it spans.
///
/// Kernels only read `first` and `last`. The layout matches the interval
/// records produced upstream, so interval arrays can be shared without copy.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Interval {
    pub start: f64,
    pub stop: f64,
    pub first: i64,
    pub last: i64,
}

impl Interval {
    pub fn new(start: f64, stop: f64, first: i64, last: i64) -> Self {
        Self { start, stop, first, last }
    }

    /// Interval over samples only, with zeroed timestamps.
    pub fn from_samples(first: i64, last: i64) -> Self {
        Self {
            start: 0.0,
            stop: 0.0,
            first,
            last,
        }
    }

    /// Number of samples covered.
    pub fn n_samples(&self) -> usize {
        (self.last - self.first + 1).max(0) as usize
    }

    pub fn contains(&self, sample: usize) -> bool {
        let s: i64 = sample as i64;
        self.first <= s && s <= self.last
    }
}

/// Checks that every interval lies in `[0, n_samp)` with `first <= last`, and
/// that consecutive intervals are sorted and do not overlap.
pub fn validate_intervals(intervals: &[Interval], n_samp: usize) -> Result<()> {
    for (index, ival) in intervals.iter().enumerate() {
        if ival.first < 0 || ival.first > ival.last || ival.last >= n_samp as i64 {
            return Err(Error::InvalidInterval {
                index,
                first: ival.first,
                last: ival.last,
                n_samp,
            });
        }
    }
    if let Some((index, _)) = intervals
        .iter()
        .tuple_windows()
        .enumerate()
        .find(|(_, (a, b))| b.first <= a.last)
    {
        return Err(Error::OverlappingIntervals { index, next: index + 1 });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_counts() {
        let ival: Interval = Interval::from_samples(3, 7);
        assert_eq!(ival.n_samples(), 5);
        assert!(ival.contains(3));
        assert!(ival.contains(7));
        assert!(!ival.contains(8));
        assert!(!ival.contains(2));
    }

    #[test]
    fn validate_accepts_disjoint_sorted() {
        let ivals: Vec<Interval> = vec![
            Interval::from_samples(0, 3),
            Interval::from_samples(4, 4),
            Interval::from_samples(10, 19),
        ];
        assert_eq!(validate_intervals(&ivals, 20), Ok(()));
        assert_eq!(validate_intervals(&[], 0), Ok(()));
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let ivals: Vec<Interval> = vec![Interval::from_samples(0, 3), Interval::from_samples(5, 20)];
        assert_eq!(
            validate_intervals(&ivals, 20),
            Err(Error::InvalidInterval {
                index: 1,
                first: 5,
                last: 20,
                n_samp: 20,
            })
        );
        assert!(matches!(
            validate_intervals(&[Interval::from_samples(4, 2)], 20),
            Err(Error::InvalidInterval { index: 0, .. })
        ));
        assert!(matches!(
            validate_intervals(&[Interval::from_samples(-1, 2)], 20),
            Err(Error::InvalidInterval { index: 0, .. })
        ));
    }

    #[test]
    fn validate_rejects_overlap() {
        let ivals: Vec<Interval> = vec![
            Interval::from_samples(0, 3),
            Interval::from_samples(6, 9),
            Interval::from_samples(9, 12),
        ];
        assert_eq!(
            validate_intervals(&ivals, 20),
            Err(Error::OverlappingIntervals { index: 1, next: 2 })
        );
    }
}
