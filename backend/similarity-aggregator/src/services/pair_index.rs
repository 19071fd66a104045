//! Running min-sum per unordered event pair
//!
//! For a pair (a, b) the index holds the sum over users who touched both
//! events of `min(weight(a, user), weight(b, user))`, the dot-product term
//! of the cosine similarity. The sum only ever moves by deltas computed from
//! one user's old and new weight.

use super::interaction::EventId;
use serde::Serialize;
use std::collections::HashMap;

/// Unordered pair of distinct events, stored as `first < second`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EventPair {
    first: EventId,
    second: EventId,
}

impl EventPair {
    /// Returns `None` when both ids are the same event
    pub fn new(a: EventId, b: EventId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self {
                first: a,
                second: b,
            }),
            std::cmp::Ordering::Greater => Some(Self {
                first: b,
                second: a,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> EventId {
        self.first
    }

    pub fn second(&self) -> EventId {
        self.second
    }
}

/// Result of propagating one weight change into a pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairUpdate {
    pub pair: EventPair,
    /// The event of the pair that did not change
    pub other_event: EventId,
    /// Min-sum after the update
    pub min_sum: f64,
}

#[derive(Debug, Default)]
pub struct PairSimilarityIndex {
    min_sums: HashMap<EventPair, f64>,
}

impl PairSimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a user's weight change on `target` to every pair it forms with
    /// the other events in that user's history
    ///
    /// `history` yields `(event_id, weight)` for the acting user and may
    /// include `target` itself, which is skipped. Work is proportional to the
    /// length of the history.
    pub fn propagate<I>(
        &mut self,
        target: EventId,
        history: I,
        old_weight: f64,
        new_weight: f64,
    ) -> Vec<PairUpdate>
    where
        I: IntoIterator<Item = (EventId, f64)>,
    {
        history
            .into_iter()
            .filter_map(|(other_event, other_weight)| {
                let pair = EventPair::new(target, other_event)?;
                let old_min = old_weight.min(other_weight);
                let new_min = new_weight.min(other_weight);
                let min_sum = self.add(pair, new_min - old_min);

                Some(PairUpdate {
                    pair,
                    other_event,
                    min_sum,
                })
            })
            .collect()
    }

    fn add(&mut self, pair: EventPair, delta: f64) -> f64 {
        let sum = self.min_sums.entry(pair).or_insert(0.0);
        *sum += delta;
        *sum
    }

    /// Current min-sum, 0 for a pair no user has touched on both sides
    pub fn min_sum(&self, pair: EventPair) -> f64 {
        self.min_sums.get(&pair).copied().unwrap_or(0.0)
    }

    pub fn pair_count(&self) -> usize {
        self.min_sums.len()
    }

    pub fn clear(&mut self) {
        self.min_sums.clear();
    }
}
