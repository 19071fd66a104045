//! Aggregator engine
//!
//! Single-writer reducer over the user action stream. Each applied action
//! updates the interaction aggregate, pushes the weight change into every
//! pair the acting user participates in, and rescores those pairs.
//!
//! The engine owns all aggregate state. Callers that share it across tasks
//! wrap it in [`SharedEngine`] so that `apply` and `reset` are serialized.

use super::interaction::{EventId, InteractionAggregate, UserId};
use super::pair_index::{EventPair, PairSimilarityIndex};
use super::scorer::SimilarityScorer;
use super::weights::weight_of;
use event_schema::{EventSimilarity, UserAction};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub type SharedEngine = Arc<Mutex<AggregatorEngine>>;

/// Size of the aggregate state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub events: usize,
    pub users: usize,
    pub pairs: usize,
    /// Actions that raised a stored weight; redeliveries are not counted
    pub actions_applied: u64,
}

#[derive(Debug, Default)]
pub struct AggregatorEngine {
    interactions: InteractionAggregate,
    pairs: PairSimilarityIndex,
    scorer: SimilarityScorer,
    actions_applied: u64,
}

impl AggregatorEngine {
    pub fn new(scorer: SimilarityScorer) -> Self {
        Self {
            scorer,
            ..Self::default()
        }
    }

    pub fn with_precision(precision: u32) -> Self {
        Self::new(SimilarityScorer::new(precision))
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }

    /// Apply one action and return every pair score it changed
    ///
    /// An action that does not raise the stored weight for its
    /// (event, user) key changes nothing and returns an empty list, which
    /// makes redelivered actions idempotent. Returned scores are strictly
    /// positive and sorted by pair.
    pub fn apply(&mut self, action: &UserAction) -> Vec<EventSimilarity> {
        let weight = weight_of(action.action_type);
        let update = self
            .interactions
            .update(action.event_id, action.user_id, weight);

        if !update.is_changed() {
            debug!(
                event_id = action.event_id,
                user_id = action.user_id,
                action = %action.action_type,
                "Weight unchanged, nothing to recompute"
            );
            return Vec::new();
        }
        self.actions_applied += 1;

        let target_total = self.total_of(action.event_id);
        let pair_updates = self.pairs.propagate(
            action.event_id,
            self.interactions.user_events(action.user_id),
            update.previous,
            weight,
        );

        let mut scores: Vec<EventSimilarity> = pair_updates
            .into_iter()
            .filter_map(|pair_update| {
                let other_total = self.total_of(pair_update.other_event);
                let score = self
                    .scorer
                    .score(target_total, other_total, pair_update.min_sum);

                (score > 0.0).then(|| EventSimilarity {
                    event_a: pair_update.pair.first(),
                    event_b: pair_update.pair.second(),
                    score,
                    timestamp: action.timestamp,
                })
            })
            .collect();
        scores.sort_by_key(|s| (s.event_a, s.event_b));

        debug!(
            event_id = action.event_id,
            user_id = action.user_id,
            delta = update.delta,
            rescored = scores.len(),
            "Applied action"
        );

        scores
    }

    /// S(event) for an event that must have a recorded interaction
    fn total_of(&self, event_id: EventId) -> f64 {
        match self.interactions.event_total(event_id) {
            Some(total) => total,
            None => panic!(
                "event {event_id} takes part in a pair but has no recorded total; \
                 aggregate state was mutated outside the engine"
            ),
        }
    }

    /// Current similarity of two events, 0 when they share no user
    pub fn similarity(&self, a: EventId, b: EventId) -> f64 {
        let Some(pair) = EventPair::new(a, b) else {
            return 0.0;
        };
        let (Some(sum_a), Some(sum_b)) = (
            self.interactions.event_total(a),
            self.interactions.event_total(b),
        ) else {
            return 0.0;
        };

        self.scorer.score(sum_a, sum_b, self.pairs.min_sum(pair))
    }

    pub fn weight(&self, event_id: EventId, user_id: UserId) -> Option<f64> {
        self.interactions.weight(event_id, user_id)
    }

    pub fn event_total(&self, event_id: EventId) -> Option<f64> {
        self.interactions.event_total(event_id)
    }

    pub fn pair_min_sum(&self, a: EventId, b: EventId) -> f64 {
        EventPair::new(a, b)
            .map(|pair| self.pairs.min_sum(pair))
            .unwrap_or(0.0)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            events: self.interactions.event_count(),
            users: self.interactions.user_count(),
            pairs: self.pairs.pair_count(),
            actions_applied: self.actions_applied,
        }
    }

    /// Drop all aggregate state, returning its size before the reset
    pub fn reset(&mut self) -> EngineStats {
        let before = self.stats();
        self.interactions.clear();
        self.pairs.clear();
        self.actions_applied = 0;
        before
    }
}
