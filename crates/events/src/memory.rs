//! In-process bus transport.

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use crate::error::EventResult;
use crate::transport::{BusTransport, DEFAULT_MAX_ENTRY_BYTES, EntryDisposition, EventEntry};

const BROADCAST_CAPACITY: usize = 256;

/// An in-process bus that accepts every well-formed entry.
///
/// Accepted entries are kept in an inspectable log and broadcast to
/// subscribers, which is what tests and single-process deployments need.
/// Rejection and outage behavior belongs to test doubles implementing
/// [`BusTransport`] directly.
pub struct InMemoryBus {
    name: String,
    accepted: RwLock<Vec<EventEntry>>,
    notify: broadcast::Sender<EventEntry>,
    max_entry_bytes: usize,
}

impl InMemoryBus {
    /// Creates a bus with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let (notify, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            name: name.into(),
            accepted: RwLock::new(Vec::new()),
            notify,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }

    /// Overrides the per-entry size limit.
    pub fn with_max_entry_bytes(mut self, limit: usize) -> Self {
        self.max_entry_bytes = limit;
        self
    }

    /// Subscribes to entries as they are accepted.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEntry> {
        self.notify.subscribe()
    }

    /// Returns a copy of every accepted entry, oldest first.
    pub async fn accepted(&self) -> Vec<EventEntry> {
        self.accepted.read().await.clone()
    }

    /// Returns how many entries have been accepted.
    pub async fn accepted_count(&self) -> usize {
        self.accepted.read().await.len()
    }
}

#[async_trait]
impl BusTransport for InMemoryBus {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_batch(&self, entries: Vec<EventEntry>) -> EventResult<Vec<EntryDisposition>> {
        let mut dispositions = Vec::with_capacity(entries.len());
        let mut log = self.accepted.write().await;

        for entry in entries {
            let event_id = uuid::Uuid::now_v7().to_string();
            // A missing or lagging subscriber is not a transport failure.
            let _ = self.notify.send(entry.clone());
            log.push(entry);
            dispositions.push(EntryDisposition::Accepted { event_id });
        }

        tracing::debug!(bus = %self.name, count = dispositions.len(), "Accepted batch");
        Ok(dispositions)
    }

    fn max_entry_bytes(&self) -> usize {
        self.max_entry_bytes
    }
}
