//! Kafka Integration for the similarity aggregator
//!
//! - Consumer: drains user actions into the aggregation pipeline
//! - Producer: publishes event similarity updates

pub mod consumer;
pub mod producer;

pub use consumer::{ActionConsumer, ActionConsumerConfig};
pub use producer::SimilarityProducer;
