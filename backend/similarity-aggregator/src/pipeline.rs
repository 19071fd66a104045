//! Action pipeline
//!
//! Turns one raw user-action payload into similarity updates:
//! decode → validate → `apply()` under the engine lock → hand-off of each
//! score to a single egress worker. The lock is released before the hand-off,
//! so a slow downstream never stalls the reducer.
//!
//! The worker publishes scores in the order they were produced, so the last
//! record for a pair is always its current score. Shutdown closes the queue,
//! waits for the worker and then closes the publisher.

use crate::error::{AggregatorError, Result};
use crate::metrics;
use crate::services::{ScorePublisher, SharedEngine};
use event_schema::{is_compatible, EventEnvelope, EventSimilarity, UserAction, SCHEMA_VERSION};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Scores buffered between the reducer and the egress worker
pub const EGRESS_QUEUE_CAPACITY: usize = 1024;

pub struct ActionPipeline {
    engine: SharedEngine,
    publisher: Arc<dyn ScorePublisher>,
    egress: Option<mpsc::Sender<EventSimilarity>>,
    worker: Option<JoinHandle<()>>,
    pending: Arc<AtomicUsize>,
}

impl ActionPipeline {
    /// Build the pipeline and start its egress worker
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(engine: SharedEngine, publisher: Arc<dyn ScorePublisher>) -> Self {
        let (egress, receiver) = mpsc::channel(EGRESS_QUEUE_CAPACITY);
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = spawn_egress_worker(Arc::clone(&publisher), receiver, Arc::clone(&pending));

        Self {
            engine,
            publisher,
            egress: Some(egress),
            worker: Some(worker),
            pending,
        }
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Number of scores handed off but not yet published
    pub fn in_flight(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Process one payload, returning how many scores were dispatched
    ///
    /// Malformed payloads are logged and skipped; they never fail the caller.
    pub async fn handle_payload(&mut self, payload: &[u8]) -> usize {
        metrics::record_action_received();

        let action = match decode_action(payload).and_then(|action| {
            validate_action(&action)?;
            Ok(action)
        }) {
            Ok(action) => action,
            Err(e) => {
                let reason = match e {
                    AggregatorError::Decode(_) => "decode",
                    _ => "validation",
                };
                metrics::record_action_skipped(reason);
                warn!(error = %e, "Skipping malformed user action");
                return 0;
            }
        };

        self.handle_action(&action).await
    }

    /// Apply a decoded action and dispatch the resulting scores
    pub async fn handle_action(&mut self, action: &UserAction) -> usize {
        let scores = {
            let mut engine = self.engine.lock().await;
            let started = Instant::now();
            let scores = engine.apply(action);
            metrics::observe_apply(started.elapsed().as_secs_f64());
            metrics::record_engine_size(&engine.stats());
            scores
        };

        let count = scores.len();
        if count > 0 {
            debug!(
                event_id = action.event_id,
                user_id = action.user_id,
                scores = count,
                "Dispatching similarity updates"
            );
            metrics::record_scores_emitted(count);
        }
        for similarity in scores {
            self.dispatch(similarity).await;
        }

        count
    }

    async fn dispatch(&mut self, similarity: EventSimilarity) {
        let Some(egress) = &self.egress else {
            warn!(
                event_a = similarity.event_a,
                event_b = similarity.event_b,
                "Pipeline already drained, dropping similarity"
            );
            metrics::record_publish_failure();
            return;
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::error::SendError(similarity)) = egress.send(similarity).await {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            metrics::record_publish_failure();
            error!(
                event_a = similarity.event_a,
                event_b = similarity.event_b,
                "Egress worker stopped, dropping similarity"
            );
        }
    }

    /// Wait for queued publishes up to `timeout`, then close the publisher
    ///
    /// Publishes still pending after the timeout are dropped. The publisher is
    /// closed in every case.
    pub async fn drain(&mut self, timeout: Duration) {
        // closing the queue lets the worker exit once it is empty
        self.egress.take();

        if let Some(mut worker) = self.worker.take() {
            let pending = self.in_flight();
            if pending > 0 {
                info!(pending, "Waiting for queued similarity publishes");
            }

            match tokio::time::timeout(timeout, &mut worker).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Egress worker did not complete"),
                Err(_) => {
                    warn!(
                        remaining = self.in_flight(),
                        timeout_ms = timeout.as_millis() as u64,
                        "Drain timed out, dropping remaining publishes"
                    );
                    worker.abort();
                    let _ = worker.await;
                    self.pending.store(0, Ordering::SeqCst);
                }
            }
        }

        if let Err(e) = self.publisher.close().await {
            error!(error = %e, "Failed to close similarity publisher");
        }
    }
}

/// Publish queued scores one at a time until the queue is closed
fn spawn_egress_worker(
    publisher: Arc<dyn ScorePublisher>,
    mut receiver: mpsc::Receiver<EventSimilarity>,
    pending: Arc<AtomicUsize>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Similarity egress worker started");

        while let Some(similarity) = receiver.recv().await {
            if let Err(e) = publisher.publish(&similarity).await {
                metrics::record_publish_failure();
                error!(
                    event_a = similarity.event_a,
                    event_b = similarity.event_b,
                    error = %e,
                    "Failed to publish similarity, dropping"
                );
            }
            pending.fetch_sub(1, Ordering::SeqCst);
        }

        debug!("Similarity egress worker stopped (queue closed)");
    })
}

/// Decode a user action, bare or wrapped in an [`EventEnvelope`]
pub fn decode_action(payload: &[u8]) -> Result<UserAction> {
    if let Ok(envelope) = serde_json::from_slice::<EventEnvelope<UserAction>>(payload) {
        if !is_compatible(SCHEMA_VERSION, envelope.schema_version) {
            return Err(AggregatorError::Validation(format!(
                "unsupported schema version {}",
                envelope.schema_version
            )));
        }
        return Ok(envelope.data);
    }

    Ok(serde_json::from_slice::<UserAction>(payload)?)
}

/// Reject actions whose ids cannot refer to a stored entity
pub fn validate_action(action: &UserAction) -> Result<()> {
    if action.event_id <= 0 {
        return Err(AggregatorError::Validation(format!(
            "Invalid event_id: {}",
            action.event_id
        )));
    }
    if action.user_id <= 0 {
        return Err(AggregatorError::Validation(format!(
            "Invalid user_id: {}",
            action.user_id
        )));
    }
    Ok(())
}
