//! Egress seam for similarity scores

use async_trait::async_trait;
use event_schema::EventSimilarity;

/// Publisher error types
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Kafka error: {0}")]
    Kafka(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Delivers similarity scores downstream
///
/// Scores are recomputations of current state, not deltas, so a failed
/// publish is dropped rather than retried; the next relevant action emits
/// the pair again.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScorePublisher: Send + Sync {
    async fn publish(&self, similarity: &EventSimilarity) -> Result<(), PublishError>;

    /// Flush buffered messages and release the transport
    async fn close(&self) -> Result<(), PublishError>;
}
