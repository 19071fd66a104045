//! User Action Kafka Consumer
//!
//! Drains the user action topic sequentially into the [`ActionPipeline`].
//! Offsets are auto-committed: redelivered actions are no-ops for the
//! engine, so at-least-once delivery is enough.

use crate::config::Config;
use crate::error::{AggregatorError, Result};
use crate::pipeline::ActionPipeline;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::ClientConfig;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct ActionConsumerConfig {
    pub brokers: String,
    pub group_id: String,
    pub topic: String,
    pub retry_backoff_ms: u64,
    pub max_retry_backoff_ms: u64,
    pub drain_timeout: Duration,
}

impl Default for ActionConsumerConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            group_id: "similarity-aggregator".to_string(),
            topic: event_schema::topics::USER_ACTIONS.to_string(),
            retry_backoff_ms: 100,
            max_retry_backoff_ms: 30_000,
            drain_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for ActionConsumerConfig {
    fn from(config: &Config) -> Self {
        Self {
            brokers: config.kafka_brokers.clone(),
            group_id: config.kafka_group_id.clone(),
            topic: config.user_actions_topic.clone(),
            drain_timeout: config.drain_timeout(),
            ..Self::default()
        }
    }
}

pub struct ActionConsumer {
    consumer: StreamConsumer,
    config: ActionConsumerConfig,
    pipeline: ActionPipeline,
    shutdown_rx: watch::Receiver<bool>,
}

impl ActionConsumer {
    pub fn new(
        config: ActionConsumerConfig,
        pipeline: ActionPipeline,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.commit.interval.ms", "5000")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "45000")
            .set("max.poll.interval.ms", "300000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| {
                error!("Failed to create Kafka consumer: {}", e);
                AggregatorError::Kafka(e)
            })?;

        consumer.subscribe(&[&config.topic]).map_err(|e| {
            error!("Failed to subscribe to topic: {}", e);
            AggregatorError::Kafka(e)
        })?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            "User action consumer initialized"
        );

        Ok(Self {
            consumer,
            config,
            pipeline,
            shutdown_rx,
        })
    }

    /// Consume until shutdown is signalled or the stream fails, then drain
    /// in-flight publishes and close the publisher
    pub async fn run(mut self) -> Result<()> {
        let result = self.consume().await;

        self.pipeline.drain(self.config.drain_timeout).await;
        info!("User action consumer stopped");

        result
    }

    async fn consume(&mut self) -> Result<()> {
        use futures::StreamExt;

        info!("Starting user action consumer loop");

        if *self.shutdown_rx.borrow() {
            return Ok(());
        }

        let mut message_stream = self.consumer.stream();
        let mut backoff_ms = self.config.retry_backoff_ms;

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Shutdown signal received, no longer accepting actions");
                        return Ok(());
                    }
                }

                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            backoff_ms = self.config.retry_backoff_ms;

                            match msg.payload() {
                                Some(payload) => {
                                    self.pipeline.handle_payload(payload).await;
                                }
                                None => {
                                    debug!(
                                        partition = msg.partition(),
                                        offset = msg.offset(),
                                        "Empty message payload, skipping"
                                    );
                                }
                            }
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka consumer error");

                            let delay = Duration::from_millis(backoff_ms);
                            if backoff_or_shutdown(&mut self.shutdown_rx, delay).await {
                                info!("Shutdown signal received during backoff");
                                return Ok(());
                            }
                            backoff_ms = (backoff_ms * 2).min(self.config.max_retry_backoff_ms);
                        }
                        None => {
                            warn!("Message stream ended unexpectedly");
                            return Err(AggregatorError::StreamEnded);
                        }
                    }
                }
            }
        }
    }
}

/// Sleep for `delay` unless shutdown is requested first
///
/// Returns `true` when the caller should stop.
async fn backoff_or_shutdown(shutdown_rx: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    if *shutdown_rx.borrow() {
        return true;
    }

    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown_rx.changed() => changed.is_err() || *shutdown_rx.borrow(),
    }
}
