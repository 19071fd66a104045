//! Similarity Aggregator - incremental event similarity over user actions
//!
//! This service provides:
//! - Monotonic-max aggregation of user interest per (event, user)
//! - Pairwise min-sum maintenance driven by each user's history
//! - Cosine similarity rescoring of every pair an action touches
//! - Kafka ingestion of user actions and publication of similarity updates

pub mod config;
pub mod error;
pub mod http;
pub mod kafka;
pub mod metrics;
pub mod pipeline;
pub mod services;
pub mod shutdown;

pub use config::Config;
pub use error::{AggregatorError, Result};
pub use kafka::{ActionConsumer, ActionConsumerConfig, SimilarityProducer};
pub use pipeline::{decode_action, validate_action, ActionPipeline};
pub use services::{
    weight_of, AggregatorEngine, EngineStats, EventPair, PublishError, ScorePublisher,
    SharedEngine, SimilarityScorer,
};
