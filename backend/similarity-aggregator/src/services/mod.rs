//! Similarity aggregation core

pub mod engine;
pub mod interaction;
pub mod pair_index;
pub mod publisher;
pub mod scorer;
pub mod weights;

pub use engine::{AggregatorEngine, EngineStats, SharedEngine};
pub use interaction::{EventId, InteractionAggregate, UserId, WeightUpdate};
pub use pair_index::{EventPair, PairSimilarityIndex, PairUpdate};
pub use publisher::{PublishError, ScorePublisher};
pub use scorer::{SimilarityScorer, DEFAULT_SCORE_PRECISION, MAX_SCORE_PRECISION};
pub use weights::weight_of;

#[cfg(test)]
pub use publisher::MockScorePublisher;
