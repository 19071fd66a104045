//! Test Harness Module
//!
//! Provides infrastructure for the similarity flow tests:
//! - In-memory score publisher that records what it receives
//! - A publisher that blocks until released, for hand-off and drain tests
//! - A publisher whose first publish is slow, for ordering tests
//! - User action payload builders

use async_trait::async_trait;
use event_schema::EventSimilarity;
use similarity_aggregator::{PublishError, ScorePublisher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Records every published score in order of completion
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<EventSimilarity>>,
    closed: AtomicBool,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<EventSimilarity> {
        self.published.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScorePublisher for RecordingPublisher {
    async fn publish(&self, similarity: &EventSimilarity) -> Result<(), PublishError> {
        self.published.lock().unwrap().push(similarity.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Holds every publish until `release` is called
#[derive(Default)]
pub struct GatedPublisher {
    gate: Notify,
    released: AtomicBool,
    inner: RecordingPublisher,
}

impl GatedPublisher {
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.gate.notify_waiters();
    }

    pub fn published(&self) -> Vec<EventSimilarity> {
        self.inner.published()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

#[async_trait]
impl ScorePublisher for GatedPublisher {
    async fn publish(&self, similarity: &EventSimilarity) -> Result<(), PublishError> {
        loop {
            let notified = self.gate.notified();
            if self.released.load(Ordering::SeqCst) {
                break;
            }
            notified.await;
        }
        self.inner.publish(similarity).await
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.inner.close().await
    }
}

/// Stalls on its first publish only, like a producer hitting a full queue
pub struct SlowFirstPublisher {
    delay: Duration,
    stalled: AtomicBool,
    inner: RecordingPublisher,
}

impl SlowFirstPublisher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            stalled: AtomicBool::new(false),
            inner: RecordingPublisher::default(),
        }
    }

    pub fn published(&self) -> Vec<EventSimilarity> {
        self.inner.published()
    }
}

#[async_trait]
impl ScorePublisher for SlowFirstPublisher {
    async fn publish(&self, similarity: &EventSimilarity) -> Result<(), PublishError> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.publish(similarity).await
    }

    async fn close(&self) -> Result<(), PublishError> {
        self.inner.close().await
    }
}

/// JSON user action as produced by the collector
pub fn action_payload(event_id: i64, user_id: i64, kind: &str) -> Vec<u8> {
    serde_json::json!({
        "event_id": event_id,
        "user_id": user_id,
        "action_type": kind,
        "timestamp": 1_700_000_000_000_i64,
    })
    .to_string()
    .into_bytes()
}
