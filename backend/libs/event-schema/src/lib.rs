//! Event Schema Registry for the statistics Kafka topics
//!
//! This library defines versioned event schemas shared by the producers of
//! user actions and the consumers of event similarity scores. Enveloped
//! messages carry a `schema_version` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// User action and similarity payloads
pub mod stats;

// Re-export commonly used types
pub use stats::{ActionKind, EventSimilarity, UserAction};

/// Current schema version for all events
pub const SCHEMA_VERSION: u32 = 1;

/// Kafka topic names used by the statistics pipeline
pub mod topics {
    /// Raw user interactions (view / register / like)
    pub const USER_ACTIONS: &str = "stats.user-actions.v1";
    /// Pairwise event similarity updates
    pub const EVENTS_SIMILARITY: &str = "stats.events-similarity.v1";
}

/// Base event envelope for all Kafka messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique event ID for idempotency and tracing
    pub event_id: Uuid,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Schema version for compatibility checking
    pub schema_version: u32,
    /// Source service that generated the event
    pub source: String,
    /// Correlation ID for distributed tracing
    pub correlation_id: Option<Uuid>,
    /// Actual event payload
    pub data: T,
}

impl<T> EventEnvelope<T> {
    pub fn new(source: impl Into<String>, data: T) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            schema_version: SCHEMA_VERSION,
            source: source.into(),
            correlation_id: None,
            data,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

// ============================================================================
// Version compatibility helpers
// ============================================================================

pub fn is_compatible(current_version: u32, message_version: u32) -> bool {
    // For now, enforce exact version match
    current_version == message_version
}
