//! Bounded Frequency Tables for Advertised Metadata
//!
//! Two of these run per window: one over advertised TX power levels, one
//! over manufacturer-data payload lengths. Each tracks at most `N` distinct
//! values; the first `N` distinct values seen claim buckets, and any further
//! distinct value is dropped without touching the existing counts.
//!
//! The read side produces the weighted statistics the feature row carries.
//! Min/max fold from caller-supplied seeds (the TX power table uses the
//! asymmetric 200/0 pair from [`constants`](crate::constants)); means use
//! truncating integer division and substitute 0 when the table is empty.

use heapless::Vec;

use crate::errors::{AggregateError, AggregateResult};

/// One (value, count) pair. Values are unique within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// The observed value.
    pub value: i32,
    /// How many times it was observed.
    pub count: u32,
}

/// Bounded frequency table over at most `N` distinct values.
#[derive(Debug, Clone, Default)]
pub struct Histogram<const N: usize> {
    buckets: Vec<Bucket, N>,
}

impl<const N: usize> Histogram<N> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self { buckets: Vec::new() }
    }

    /// Count one observation of `value`.
    ///
    /// A known value increments its bucket; a new value claims a bucket
    /// while capacity remains. With the table full, the observation is
    /// rejected with [`AggregateError::HistogramFull`] and counted nowhere.
    pub fn observe(&mut self, value: i32) -> AggregateResult<()> {
        for bucket in self.buckets.iter_mut() {
            if bucket.value == value {
                bucket.count += 1;
                return Ok(());
            }
        }
        self.buckets
            .push(Bucket { value, count: 1 })
            .map_err(|_| AggregateError::HistogramFull)?;
        Ok(())
    }

    /// Number of distinct values tracked.
    pub fn distinct(&self) -> usize {
        self.buckets.len()
    }

    /// Whether nothing was observed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total observation count (sum over all buckets).
    pub fn total(&self) -> i32 {
        self.buckets.iter().map(|b| b.count as i32).sum()
    }

    /// Count-weighted mean value, truncated; 0 when the table is empty.
    pub fn weighted_mean(&self) -> i32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        let weighted: i32 = self.buckets.iter().map(|b| b.value * b.count as i32).sum();
        weighted / total
    }

    /// Sum of the distinct values (each counted once, however often seen).
    pub fn distinct_sum(&self) -> i32 {
        self.buckets.iter().map(|b| b.value).sum()
    }

    /// Minimum tracked value, folded from `seed`. An empty table reports
    /// the seed itself.
    pub fn min_value(&self, seed: i32) -> i32 {
        self.buckets.iter().fold(seed, |min, b| min.min(b.value))
    }

    /// Maximum tracked value, folded from `seed`.
    pub fn max_value(&self, seed: i32) -> i32 {
        self.buckets.iter().fold(seed, |max, b| max.max(b.value))
    }

    /// Forget all buckets.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn counts_accumulate_per_value() {
        let mut histogram: Histogram<4> = Histogram::new();
        histogram.observe(4).unwrap();
        histogram.observe(4).unwrap();
        histogram.observe(8).unwrap();
        assert_eq!(histogram.distinct(), 2);
        assert_eq!(histogram.total(), 3);
        // (4*2 + 8*1) / 3 truncates to 5
        assert_eq!(histogram.weighted_mean(), 5);
        assert_eq!(histogram.distinct_sum(), 12);
    }

    #[test]
    fn overflow_value_is_counted_nowhere() {
        let mut histogram: Histogram<2> = Histogram::new();
        histogram.observe(1).unwrap();
        histogram.observe(2).unwrap();
        assert_eq!(histogram.observe(3), Err(AggregateError::HistogramFull));
        assert_eq!(histogram.total(), 2);
        assert_eq!(histogram.distinct(), 2);
        // Known values still count after the table filled
        histogram.observe(1).unwrap();
        assert_eq!(histogram.total(), 3);
    }

    #[test]
    fn empty_table_reports_seeds_and_zeros() {
        let histogram: Histogram<8> = Histogram::new();
        assert_eq!(histogram.total(), 0);
        assert_eq!(histogram.weighted_mean(), 0);
        assert_eq!(histogram.distinct_sum(), 0);
        assert_eq!(histogram.min_value(200), 200);
        assert_eq!(histogram.max_value(0), 0);
    }

    #[test]
    fn min_max_fold_from_seed() {
        let mut histogram: Histogram<8> = Histogram::new();
        histogram.observe(250).unwrap();
        // 250 beats the max seed but not the min seed of 200
        assert_eq!(histogram.min_value(200), 200);
        assert_eq!(histogram.max_value(0), 250);
        histogram.observe(3).unwrap();
        assert_eq!(histogram.min_value(200), 3);
    }

    proptest! {
        #[test]
        fn total_matches_observation_count(values in proptest::collection::vec(0i32..6, 0..200)) {
            let mut histogram: Histogram<8> = Histogram::new();
            for &value in &values {
                // At most 6 distinct values, so nothing ever overflows
                histogram.observe(value).unwrap();
            }
            prop_assert_eq!(histogram.total(), values.len() as i32);
        }
    }
}
