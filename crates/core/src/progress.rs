//! Progress events: fire-and-forget notifications about a research run.
//!
//! The loop reports what it is doing (searching, fetching, which iteration it
//! is on) through a [`ProgressSink`]. Emitting never blocks and never fails;
//! rendering is up to the consumer.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// The category of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    Info,
    Search,
    Content,
    Iteration,
    FinalReport,
    Error,
}

impl ProgressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Search => "search",
            Self::Content => "content",
            Self::Iteration => "iteration",
            Self::FinalReport => "final_report",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress notification.
///
/// Only `Iteration` carries counters; it is the sole source of truth for how
/// far along a run is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    Info { message: String },
    Search { message: String },
    Content { message: String },
    Iteration { message: String, iteration: u32, total: u32 },
    FinalReport { message: String },
    Error { message: String },
}

impl ProgressEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info { message: message.into() }
    }

    pub fn search(message: impl Into<String>) -> Self {
        Self::Search { message: message.into() }
    }

    pub fn content(message: impl Into<String>) -> Self {
        Self::Content { message: message.into() }
    }

    pub fn iteration(iteration: u32, total: u32) -> Self {
        Self::Iteration {
            message: format!("Research iteration {iteration}/{total}"),
            iteration,
            total,
        }
    }

    pub fn final_report(message: impl Into<String>) -> Self {
        Self::FinalReport { message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    pub fn kind(&self) -> ProgressKind {
        match self {
            Self::Info { .. } => ProgressKind::Info,
            Self::Search { .. } => ProgressKind::Search,
            Self::Content { .. } => ProgressKind::Content,
            Self::Iteration { .. } => ProgressKind::Iteration,
            Self::FinalReport { .. } => ProgressKind::FinalReport,
            Self::Error { .. } => ProgressKind::Error,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info { message }
            | Self::Search { message }
            | Self::Content { message }
            | Self::Iteration { message, .. }
            | Self::FinalReport { message }
            | Self::Error { message } => message,
        }
    }

    /// Completed fraction of the run, for `Iteration` events only.
    pub fn fraction(&self) -> Option<f32> {
        match self {
            Self::Iteration { iteration, total, .. } if *total > 0 => {
                Some(*iteration as f32 / *total as f32)
            }
            _ => None,
        }
    }
}

/// Receives progress events. Implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(&event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// A broadcast-based progress bus.
///
/// Uses `tokio::sync::broadcast`, so every subscriber sees events in the order
/// they were emitted. Publishing with no subscribers is fine.
pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    /// Create a new bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ProgressSink for ProgressBus {
    fn emit(&self, event: ProgressEvent) {
        tracing::trace!(kind = %event.kind(), message = event.message(), "progress");
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn bus_delivers_in_emission_order() {
        let bus = ProgressBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(ProgressEvent::search("Searching for: metformin"));
        bus.emit(ProgressEvent::iteration(1, 3));
        bus.emit(ProgressEvent::error("boom"));

        assert_eq!(rx.recv().await.unwrap().kind(), ProgressKind::Search);
        assert_eq!(rx.recv().await.unwrap().kind(), ProgressKind::Iteration);
        assert_eq!(rx.recv().await.unwrap().kind(), ProgressKind::Error);
    }

    #[test]
    fn bus_without_subscribers_doesnt_panic() {
        let bus = ProgressBus::new(4);
        bus.emit(ProgressEvent::info("nobody listening"));
    }

    #[test]
    fn closure_sink_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |event: &ProgressEvent| seen.lock().unwrap().push(event.clone())
        };
        sink.emit(ProgressEvent::content("Retrieving content"));
        assert_eq!(seen.lock().unwrap()[0].message(), "Retrieving content");
    }

    #[test]
    fn only_iteration_reports_a_fraction() {
        assert_eq!(ProgressEvent::iteration(2, 4).fraction(), Some(0.5));
        assert_eq!(ProgressEvent::info("x").fraction(), None);
    }

    #[test]
    fn iteration_event_serialization() {
        let json = serde_json::to_string(&ProgressEvent::iteration(1, 3)).unwrap();
        assert!(json.contains(r#""kind":"iteration""#));
        assert!(json.contains(r#""iteration":1"#));
        assert!(json.contains(r#""total":3"#));
        let json = serde_json::to_string(&ProgressEvent::final_report("done")).unwrap();
        assert!(json.contains(r#""kind":"final_report""#));
        assert!(!json.contains("total"));
    }
}
