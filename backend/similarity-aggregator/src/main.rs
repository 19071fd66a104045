//! Similarity Aggregator - Main entry point
//!
//! Consumes user actions from Kafka, maintains event similarity aggregates in
//! memory and publishes every changed score. An admin HTTP server exposes
//! health checks, Prometheus metrics, state stats and reset.

use anyhow::{Context, Result};
use similarity_aggregator::{
    http, shutdown, ActionConsumer, ActionConsumerConfig, ActionPipeline, AggregatorEngine,
    Config, SharedEngine, SimilarityProducer,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "info,similarity_aggregator=debug,rdkafka=warn".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting similarity-aggregator");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        brokers = %config.kafka_brokers,
        actions_topic = %config.user_actions_topic,
        similarity_topic = %config.events_similarity_topic,
        score_precision = config.score_precision,
        "Configuration loaded"
    );

    let engine = AggregatorEngine::with_precision(config.score_precision).into_shared();

    // Bind before any Kafka client exists, so a busy port exits with
    // nothing left to flush
    let server = http::bind_admin_server(Arc::clone(&engine), ("0.0.0.0", config.http_port))
        .context("Failed to bind HTTP server")?;
    let server_handle = server.handle();
    actix_rt::spawn(server);
    info!(port = config.http_port, "Admin HTTP server started");

    let shutdown_rx = shutdown::forward_shutdown(tokio::signal::ctrl_c());

    let consumer = match build_consumer(&config, &engine, shutdown_rx) {
        Ok(consumer) => consumer,
        Err(e) => {
            server_handle.stop(true).await;
            return Err(e);
        }
    };

    let consumer_handle = tokio::spawn(consumer.run());

    // The consumer returns after shutdown or a fatal stream error, in both
    // cases with in-flight publishes drained and the producer flushed
    match consumer_handle.await {
        Ok(Ok(())) => info!("Consumer finished"),
        Ok(Err(e)) => error!(error = %e, "Consumer exited with error"),
        Err(e) => error!(error = %e, "Consumer task panicked"),
    }

    server_handle.stop(true).await;

    let stats = engine.lock().await.stats();
    info!(
        events = stats.events,
        pairs = stats.pairs,
        actions_applied = stats.actions_applied,
        "Shutting down similarity-aggregator"
    );

    Ok(())
}

fn build_consumer(
    config: &Config,
    engine: &SharedEngine,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<ActionConsumer> {
    let producer = SimilarityProducer::new(
        &config.kafka_brokers,
        config.events_similarity_topic.clone(),
        config.publish_timeout(),
    )
    .context("Failed to create Kafka producer")?;

    let pipeline = ActionPipeline::new(Arc::clone(engine), Arc::new(producer));

    ActionConsumer::new(ActionConsumerConfig::from(config), pipeline, shutdown_rx)
        .context("Failed to create Kafka consumer")
}
