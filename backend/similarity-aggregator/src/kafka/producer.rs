//! Similarity Kafka Producer
//!
//! Publishes event similarity updates, keyed by the first event of the pair.

use crate::services::{PublishError, ScorePublisher};
use async_trait::async_trait;
use event_schema::EventSimilarity;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, error, info};

pub struct SimilarityProducer {
    producer: FutureProducer,
    topic: String,
    delivery_timeout: Duration,
}

impl SimilarityProducer {
    pub fn new(
        brokers: &str,
        topic: impl Into<String>,
        delivery_timeout: Duration,
    ) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("max.in.flight.requests.per.connection", "5")
            .set("compression.type", "lz4")
            .set("linger.ms", "10")
            .set("message.timeout.ms", "30000")
            .create()?;

        let topic = topic.into();
        info!(
            brokers = %brokers,
            topic = %topic,
            "Similarity Kafka producer initialized"
        );

        Ok(Self {
            producer,
            topic,
            delivery_timeout,
        })
    }
}

#[async_trait]
impl ScorePublisher for SimilarityProducer {
    async fn publish(&self, similarity: &EventSimilarity) -> Result<(), PublishError> {
        let payload = serde_json::to_string(similarity)
            .map_err(|e| PublishError::Serialization(e.to_string()))?;

        let key = similarity.kafka_key();

        let record = FutureRecord::to(&self.topic)
            .key(&key)
            .payload(&payload)
            .timestamp(similarity.timestamp.timestamp_millis());

        match self.producer.send(record, self.delivery_timeout).await {
            Ok((partition, offset)) => {
                debug!(
                    event_a = similarity.event_a,
                    event_b = similarity.event_b,
                    score = similarity.score,
                    partition = partition,
                    offset = offset,
                    "Published event similarity"
                );
                Ok(())
            }
            Err((err, _)) => Err(PublishError::Kafka(err.to_string())),
        }
    }

    async fn close(&self) -> Result<(), PublishError> {
        info!(topic = %self.topic, "Flushing similarity producer");
        self.producer.flush(self.delivery_timeout).map_err(|e| {
            error!(error = %e, "Similarity producer flush failed");
            PublishError::Kafka(e.to_string())
        })
    }
}
