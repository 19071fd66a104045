//! Configuration for the similarity aggregator
use crate::services::DEFAULT_SCORE_PRECISION;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration struct, loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Kafka broker addresses
    #[serde(default = "default_kafka_brokers")]
    pub kafka_brokers: String,

    /// Consumer group for the user action topic
    #[serde(default = "default_kafka_group_id")]
    pub kafka_group_id: String,

    /// Inbound user action topic
    #[serde(default = "default_user_actions_topic")]
    pub user_actions_topic: String,

    /// Outbound similarity topic
    #[serde(default = "default_events_similarity_topic")]
    pub events_similarity_topic: String,

    /// Admin HTTP port (health, metrics, reset)
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Decimal places kept in emitted scores
    #[serde(default = "default_score_precision")]
    pub score_precision: u32,

    /// Delivery timeout for a single similarity message
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// How long shutdown waits for in-flight publishes
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_kafka_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_kafka_group_id() -> String {
    "similarity-aggregator".to_string()
}

fn default_user_actions_topic() -> String {
    event_schema::topics::USER_ACTIONS.to_string()
}

fn default_events_similarity_topic() -> String {
    event_schema::topics::EVENTS_SIMILARITY.to_string()
}

fn default_http_port() -> u16 {
    8090
}

fn default_score_precision() -> u32 {
    DEFAULT_SCORE_PRECISION
}

fn default_publish_timeout_ms() -> u64 {
    5000
}

fn default_drain_timeout_ms() -> u64 {
    10_000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
