//! In-memory log buffer and live log streaming
//!
//! [`LogBufferLayer`] is installed into the daemon's tracing subscriber and
//! copies every event into a bounded [`LogBuffer`]; `/logs` replays the most
//! recent entries and then follows new ones over server-sent events.

use crate::state::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Html;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event as TracingEvent, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Entries kept in memory
pub const LOG_BUFFER_CAPACITY: usize = 1000;

/// Entries replayed to a new `/logs` subscriber
pub const LOG_REPLAY_COUNT: usize = 100;

const LIVE_CHANNEL_CAPACITY: usize = 256;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unix time in seconds
    pub timestamp: f64,
    pub level: String,
    pub message: String,
    pub logger: String,
}

pub struct LogBuffer {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    live: broadcast::Sender<LogEntry>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            live,
        }
    }

    pub fn push(&self, entry: LogEntry) {
        {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }
        // No subscribers is fine
        let _ = self.live.send(entry);
    }

    /// The `n` most recent entries, oldest first
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.live.subscribe()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(LOG_BUFFER_CAPACITY)
    }
}

// ============================================================================
// Tracing layer
// ============================================================================

pub struct LogBufferLayer {
    buffer: Arc<LogBuffer>,
}

impl LogBufferLayer {
    pub fn new(buffer: Arc<LogBuffer>) -> Self {
        Self { buffer }
    }
}

/// Collects the event message followed by its fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for LogBufferLayer {
    fn on_event(&self, event: &TracingEvent<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let now = chrono::Utc::now();
        self.buffer.push(LogEntry {
            timestamp: now.timestamp_millis() as f64 / 1000.0,
            level: metadata.level().to_string(),
            message: format!("{}{}", visitor.message, visitor.fields),
            logger: metadata.target().to_string(),
        });
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn entry_event(entry: &LogEntry) -> Event {
    Event::default().data(serde_json::to_string(entry).unwrap_or_default())
}

/// GET /logs
pub async fn stream_logs(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before replaying so nothing logged in between is lost
    let mut live = state.logs.subscribe();
    let replay = state.logs.recent(LOG_REPLAY_COUNT);

    let stream = async_stream::stream! {
        for entry in &replay {
            yield Ok(entry_event(entry));
        }

        loop {
            match live.recv().await {
                Ok(entry) => yield Ok(entry_event(&entry)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}

/// GET /log-viewer
pub async fn log_viewer() -> Html<&'static str> {
    Html(include_str!("log_viewer.html"))
}
