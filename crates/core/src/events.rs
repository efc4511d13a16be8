//! In-process event bus for conversion outcomes.
//!
//! A publish/subscribe hub backed by a `tokio::sync::broadcast`
//! channel, shared via `Arc<EventBus>` across the application. The
//! launcher publishes an event when a job reaches a terminal state;
//! the activity log subscribes if it cares. Publishing is best-effort:
//! zero subscribers is not an error and can never affect a job's
//! outcome.

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::types::Timestamp;

/// Event type published when a conversion succeeds.
pub const EVENT_CONVERSION_COMPLETED: &str = "conversion.completed";

/// Event type published when a conversion fails.
pub const EVENT_CONVERSION_FAILED: &str = "conversion.failed";

/// A terminal conversion outcome, broadcast to interested subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionEvent {
    /// Dot-separated event name.
    pub event_type: &'static str,
    pub job_id: String,
    pub project: Option<String>,
    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,
    pub timestamp: Timestamp,
}

impl ConversionEvent {
    /// Event for a successfully completed job.
    pub fn completed(job_id: String, project: Option<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: EVENT_CONVERSION_COMPLETED,
            job_id,
            project,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Event for a failed job.
    pub fn failed(job_id: String, project: Option<String>, error: &str) -> Self {
        Self {
            event_type: EVENT_CONVERSION_FAILED,
            job_id,
            project,
            payload: serde_json::json!({ "error": error }),
            timestamp: Utc::now(),
        }
    }
}

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// When the buffer is full, the oldest un-consumed messages are dropped
/// and slow receivers observe a `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<ConversionEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: ConversionEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<ConversionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
