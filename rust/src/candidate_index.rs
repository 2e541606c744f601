//! Position-keyed candidate lookup.
//!
//! Groups actions by their start position so that "actions starting where
//! another action ends" can be fetched without scanning the whole input.

use rustc_hash::FxHashMap;

use crate::models::{Action, Position};

/// Buckets of actions keyed by start position.
///
/// Buckets borrow the caller's actions and keep input order until
/// [`CandidateIndex::sort_by_time`] is called. The index lives for a single
/// strategy invocation.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex<'a> {
    buckets: FxHashMap<Position, Vec<&'a Action>>,
    sorted: bool,
}

impl<'a> CandidateIndex<'a> {
    /// Build an unsorted index keyed by each action's start position.
    pub fn build(actions: &'a [Action]) -> Self {
        let mut buckets: FxHashMap<Position, Vec<&'a Action>> = FxHashMap::default();
        for action in actions {
            buckets.entry(action.start).or_default().push(action);
        }
        Self {
            buckets,
            sorted: false,
        }
    }

    /// Build the index and sort every bucket by time step.
    pub fn build_sorted(actions: &'a [Action]) -> Self {
        let mut index = Self::build(actions);
        index.sort_by_time();
        index
    }

    /// Sort each bucket ascending by time step.
    ///
    /// The sort is stable: candidates with equal time steps keep input order,
    /// so the latest-in-input of them is the one found by
    /// [`CandidateIndex::nearest_at_or_before`].
    pub fn sort_by_time(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.sort_by(|a, b| a.time_order(b));
        }
        self.sorted = true;
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Actions starting at `pos`; empty when there are none.
    pub fn candidates(&self, pos: Position) -> &[&'a Action] {
        self.buckets.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Latest candidate at `pos` whose time step does not exceed `time_step`.
    ///
    /// Upper-bound search over the sorted bucket followed by one step back.
    pub fn nearest_at_or_before(&self, pos: Position, time_step: i64) -> Option<&'a Action> {
        debug_assert!(self.sorted, "nearest_at_or_before requires a sorted index");
        let bucket = self.candidates(pos);
        let upper = bucket.partition_point(|c| c.time_step <= time_step);
        upper.checked_sub(1).map(|i| bucket[i])
    }

    /// Number of distinct start positions.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Size of the largest bucket.
    pub fn max_bucket_len(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }
}
