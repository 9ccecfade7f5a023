//! Non-blocking telemetry sinks.
//!
//! The controller publishes [`TelemetryEvent`]s from inside a tick, so a sink
//! must never block or fail: delivery is best-effort and a sink that cannot
//! accept an event drops it.

use std::sync::Arc;

use parkgate_core::TelemetryEvent;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

/// Destination for telemetry events.
pub trait TelemetrySink: Send {
    /// Hand over an event without waiting.
    fn publish(&mut self, event: TelemetryEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn publish(&mut self, event: TelemetryEvent) {
        trace!(kind = event.kind(), "Telemetry disabled, event discarded");
    }
}

/// Forwards events to a bounded channel drained by the telemetry client.
///
/// # Examples
///
/// ```
/// use parkgate_controller::telemetry::{ChannelSink, TelemetrySink};
/// use parkgate_core::TelemetryEvent;
///
/// let (mut sink, mut rx) = ChannelSink::new(8);
/// sink.publish(TelemetryEvent::RfidAccess {
///     timestamp: None,
///     card_uid: "1C:21:09:49".to_string(),
///     authorized: true,
///     action: "entry_granted".to_string(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().kind(), "rfid_access");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<TelemetryEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver to hand to the telemetry client.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<TelemetryEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelSink {
    fn publish(&mut self, event: TelemetryEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(kind = event.kind(), "Telemetry queue full, event dropped");
            }
            Err(TrySendError::Closed(event)) => {
                warn!(kind = event.kind(), "Telemetry client gone, event dropped");
            }
        }
    }
}

/// Keeps every event in memory.
///
/// Cloning shares the underlying buffer, so a test keeps one clone and hands
/// the other to the controller.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    /// Events of one kind, in publication order.
    pub fn of_kind(&self, kind: &str) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl TelemetrySink for MemorySink {
    fn publish(&mut self, event: TelemetryEvent) {
        self.events.lock().push(event);
    }
}
