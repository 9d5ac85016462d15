//! Timestamp lookup over a sorted record sequence
//!
//! All playback lookups go through here: snapshot brackets for
//! interpolation and cursor resynchronization for commands and inputs.
//! Every query is a binary search over a cached timestamp array.

use super::types::Timed;

/// Sorted timestamps of one record sequence
#[derive(Debug, Clone, Default)]
pub struct TimeIndex {
    times: Vec<f64>,
}

impl TimeIndex {
    /// Extract the timestamps of `records`, which must already be sorted
    pub fn build<T: Timed>(records: &[T]) -> Self {
        Self {
            times: records.iter().map(Timed::timestamp).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn time_at(&self, index: usize) -> Option<f64> {
        self.times.get(index).copied()
    }

    /// Leftmost insertion point of `t` (first index with timestamp >= t)
    pub fn lower_bound(&self, t: f64) -> usize {
        self.times.partition_point(|&time| time < t)
    }

    /// Number of records with timestamp <= t
    pub fn count_at_or_before(&self, t: f64) -> usize {
        self.times.partition_point(|&time| time <= t)
    }

    /// Index of the last record with timestamp <= t
    pub fn last_at_or_before(&self, t: f64) -> Option<usize> {
        self.count_at_or_before(t).checked_sub(1)
    }

    /// Indices of the records surrounding `t`.
    ///
    /// Inside the covered range the pair satisfies
    /// `time[prev] <= t <= time[next]`; outside it the two nearest records
    /// at that end are returned. Fewer than two records give `None`.
    pub fn bracket(&self, t: f64) -> Option<(usize, usize)> {
        let len = self.times.len();
        if len < 2 {
            return None;
        }
        Some(match self.lower_bound(t) {
            0 => (0, 1),
            idx if idx >= len => (len - 2, len - 1),
            idx => (idx - 1, idx),
        })
    }
}

/// Borrowing form of [`TimeIndex::bracket`] for one-off lookups
pub fn bracket<T: Timed>(records: &[T], t: f64) -> Option<(&T, &T)> {
    TimeIndex::build(records)
        .bracket(t)
        .map(|(prev, next)| (&records[prev], &records[next]))
}
