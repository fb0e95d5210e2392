//! Core event bus for the Revolve refresh pipeline.
//!
//! The bus provides a typed event enum, sequential identifiers, and support for
//! replaying recent events to late subscribers (e.g. a progress renderer that
//! attaches after the run has started). Internally it uses `tokio::broadcast`
//! with a bounded buffer; when the channel overflows, the oldest events are
//! dropped, matching the desired backpressure behaviour.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::{Receiver, Sender};
use uuid::Uuid;

/// Identifier assigned to each event emitted by a refresh run.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
const DEFAULT_REPLAY_CAPACITY: usize = 256;

/// Typed lifecycle events surfaced by the refresh pipeline.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A refresh run began for the given target.
    RunStarted {
        /// Identifier of the run.
        run_id: Uuid,
        /// Target database name.
        database: String,
        /// Mount path backing the target database.
        mount_path: String,
        /// Array volume the data is copied from.
        source_volume: String,
        /// Array volume the data is copied onto.
        target_volume: String,
    },
    /// A pipeline step began executing.
    StepStarted {
        /// Identifier of the run.
        run_id: Uuid,
        /// Step name (e.g. `take_offline`).
        step: String,
    },
    /// A pipeline step finished successfully.
    StepCompleted {
        /// Identifier of the run.
        run_id: Uuid,
        /// Step name.
        step: String,
        /// Optional human-readable step detail.
        detail: Option<String>,
    },
    /// A pipeline step was not applicable for this run.
    StepSkipped {
        /// Identifier of the run.
        run_id: Uuid,
        /// Step name.
        step: String,
        /// Optional human-readable reason.
        detail: Option<String>,
    },
    /// A pipeline step failed; the run aborts after this event.
    StepFailed {
        /// Identifier of the run.
        run_id: Uuid,
        /// Step name.
        step: String,
        /// Failure message.
        message: String,
    },
    /// The run completed; the target database is back online.
    RunCompleted {
        /// Identifier of the run.
        run_id: Uuid,
    },
    /// The run failed at the named step and stopped forward progress.
    RunFailed {
        /// Identifier of the run.
        run_id: Uuid,
        /// Step the run failed at.
        step: String,
        /// Failure message.
        message: String,
    },
    /// Releasing the copy-session token failed; the run outcome is unchanged.
    SessionCleanupFailed {
        /// Identifier of the run.
        run_id: Uuid,
        /// Failure message.
        message: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for log and progress consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::StepStarted { .. } => "step_started",
            Self::StepCompleted { .. } => "step_completed",
            Self::StepSkipped { .. } => "step_skipped",
            Self::StepFailed { .. } => "step_failed",
            Self::RunCompleted { .. } => "run_completed",
            Self::RunFailed { .. } => "run_failed",
            Self::SessionCleanupFailed { .. } => "session_cleanup_failed",
        }
    }

    /// Identifier of the run the event belongs to.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::StepStarted { run_id, .. }
            | Self::StepCompleted { run_id, .. }
            | Self::StepSkipped { run_id, .. }
            | Self::StepFailed { run_id, .. }
            | Self::RunCompleted { run_id }
            | Self::RunFailed { run_id, .. }
            | Self::SessionCleanupFailed { run_id, .. } => *run_id,
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier assigned by the bus.
    pub id: EventId,
    /// Emission timestamp.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub event: Event,
}

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    buffer: Arc<Mutex<VecDeque<EventEnvelope>>>,
    next_id: Arc<std::sync::atomic::AtomicU64>,
    replay_capacity: usize,
}

impl EventBus {
    /// Construct a new bus with the provided broadcast capacity.
    ///
    /// The broadcast channel uses the same capacity as the in-memory replay
    /// buffer, ensuring dropped events impact both structures consistently.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "event bus capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            next_id: Arc::new(std::sync::atomic::AtomicU64::new(1)),
            replay_capacity: capacity,
        }
    }

    /// Construct a bus with the default in-memory buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_REPLAY_CAPACITY)
    }

    /// Publish a new event to the bus, assigning it a sequential identifier.
    ///
    /// # Panics
    ///
    /// Panics if the replay buffer mutex has been poisoned.
    #[must_use]
    pub fn publish(&self, event: Event) -> EventId {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        {
            let mut buffer = self.buffer.lock().expect("event buffer mutex poisoned");
            if buffer.len() == self.replay_capacity {
                buffer.pop_front();
            }
            buffer.push_back(envelope.clone());
        }

        let _ = self.sender.send(envelope);
        id
    }

    /// Subscribe to the bus, replaying any buffered events newer than `since_id`.
    ///
    /// # Panics
    ///
    /// Panics if the replay buffer mutex has been poisoned.
    #[must_use]
    pub fn subscribe(&self, since_id: Option<EventId>) -> EventStream {
        let mut backlog = VecDeque::new();
        if let Some(since) = since_id {
            let buffer = self.buffer.lock().expect("event buffer mutex poisoned");
            for item in buffer.iter() {
                if item.id > since {
                    backlog.push_back(item.clone());
                }
            }
        }

        let receiver = self.sender.subscribe();
        EventStream { backlog, receiver }
    }

    /// Returns the last assigned identifier, if any events have been published.
    ///
    /// # Panics
    ///
    /// Panics if the replay buffer mutex has been poisoned.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        let buffer = self.buffer.lock().expect("event buffer mutex poisoned");
        buffer.back().map(|event| event.id)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream wrapper that yields events either from the replay backlog or from the
/// live broadcast channel.
pub struct EventStream {
    backlog: VecDeque<EventEnvelope>,
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Receive the next event, respecting the replay backlog first.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        if let Some(event) = self.backlog.pop_front() {
            return Some(event);
        }

        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(_)) => self.receiver.recv().await.ok(),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_step_event(run_id: Uuid, step: &str) -> Event {
        Event::StepCompleted {
            run_id,
            step: step.to_string(),
            detail: None,
        }
    }

    #[tokio::test]
    async fn sequential_ids_and_replay() {
        let bus = EventBus::with_capacity(16);
        let run_id = Uuid::new_v4();

        let mut last_id = 0;
        for step in ["take_offline", "unmount", "copy_volume", "remount", "bring_online"] {
            last_id = bus.publish(sample_step_event(run_id, step));
        }
        assert_eq!(last_id, 5);

        let mut stream = bus.subscribe(Some(2));
        let mut received = Vec::new();
        for _ in 0..3 {
            if let Some(event) = stream.next().await {
                received.push(event);
            }
        }

        assert_eq!(received.len(), 3);
        assert_eq!(received.first().map(|envelope| envelope.id), Some(3));
        assert_eq!(received.last().map(|envelope| envelope.id), Some(5));
    }

    #[tokio::test]
    async fn replay_ring_drops_oldest_events() {
        let bus = EventBus::with_capacity(2);
        let run_id = Uuid::new_v4();

        let _ = bus.publish(sample_step_event(run_id, "take_offline"));
        let _ = bus.publish(sample_step_event(run_id, "unmount"));
        let _ = bus.publish(sample_step_event(run_id, "copy_volume"));

        let mut stream = bus.subscribe(Some(0));
        let first = stream.next().await.expect("expected replayed event");
        assert_eq!(first.id, 2, "oldest event should have been evicted");
        assert_eq!(bus.last_event_id(), Some(3));
    }

    #[test]
    fn kind_maps_every_variant() {
        let run_id = Uuid::nil();
        let failed = Event::RunFailed {
            run_id,
            step: "copy_volume".to_string(),
            message: "array rejected the request".to_string(),
        };
        assert_eq!(failed.kind(), "run_failed");
        assert_eq!(failed.run_id(), run_id);

        let cleanup = Event::SessionCleanupFailed {
            run_id,
            message: "session expired".to_string(),
        };
        assert_eq!(cleanup.kind(), "session_cleanup_failed");
    }
}
