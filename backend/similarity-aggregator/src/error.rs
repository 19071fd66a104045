use thiserror::Error;

pub type Result<T> = std::result::Result<T, AggregatorError>;

#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Publish error: {0}")]
    Publish(#[from] crate::services::PublishError),

    #[error("Consumer stream ended")]
    StreamEnded,
}
