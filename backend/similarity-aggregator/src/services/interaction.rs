//! Per (event, user) maximum interaction weight and per-event totals
//!
//! Weights are stored per user so that the events a user touched can be
//! enumerated without scanning every event in the system.

use std::collections::HashMap;

pub type EventId = i64;
pub type UserId = i64;

/// Outcome of recording a weight for an (event, user) key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightUpdate {
    /// Increase of the stored maximum, 0 when nothing changed
    pub delta: f64,
    /// Stored maximum before the update, 0 when the key was new
    pub previous: f64,
}

impl WeightUpdate {
    pub fn is_changed(&self) -> bool {
        self.delta > 0.0
    }
}

/// Running maximum weight per (event, user) and total weight per event
#[derive(Debug, Default)]
pub struct InteractionAggregate {
    /// user_id -> (event_id -> max weight)
    user_weights: HashMap<UserId, HashMap<EventId, f64>>,
    /// event_id -> sum over users of their max weight
    event_totals: HashMap<EventId, f64>,
}

impl InteractionAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `new_weight` for (event, user) with monotonic-max semantics
    ///
    /// A weight that does not exceed the stored maximum leaves every
    /// aggregate untouched and reports a zero delta.
    pub fn update(&mut self, event_id: EventId, user_id: UserId, new_weight: f64) -> WeightUpdate {
        let previous = self.weight(event_id, user_id).unwrap_or(0.0);

        if new_weight.is_nan() || new_weight <= previous {
            return WeightUpdate {
                delta: 0.0,
                previous,
            };
        }

        let delta = new_weight - previous;
        self.user_weights
            .entry(user_id)
            .or_default()
            .insert(event_id, new_weight);
        *self.event_totals.entry(event_id).or_insert(0.0) += delta;

        WeightUpdate { delta, previous }
    }

    pub fn weight(&self, event_id: EventId, user_id: UserId) -> Option<f64> {
        self.user_weights
            .get(&user_id)
            .and_then(|events| events.get(&event_id))
            .copied()
    }

    /// S(event); `None` if no user has interacted with the event
    pub fn event_total(&self, event_id: EventId) -> Option<f64> {
        self.event_totals.get(&event_id).copied()
    }

    /// Every event the user has a recorded weight for, with that weight
    pub fn user_events(&self, user_id: UserId) -> impl Iterator<Item = (EventId, f64)> + '_ {
        self.user_weights
            .get(&user_id)
            .into_iter()
            .flat_map(|events| events.iter().map(|(event_id, weight)| (*event_id, *weight)))
    }

    pub fn event_count(&self) -> usize {
        self.event_totals.len()
    }

    pub fn user_count(&self) -> usize {
        self.user_weights.len()
    }

    pub fn clear(&mut self) {
        self.user_weights.clear();
        self.event_totals.clear();
    }
}
