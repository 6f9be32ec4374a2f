//! Bus transport abstraction.

use async_trait::async_trait;

use crate::envelope::EventEnvelope;
use crate::error::EventResult;

/// Default per-entry size limit (256 KiB), the cap common managed buses
/// apply to a single entry.
pub const DEFAULT_MAX_ENTRY_BYTES: usize = 256 * 1024;

/// One envelope in wire form: the detail serialized to JSON text, ready for
/// a batch submission.
#[derive(Debug, Clone)]
pub struct EventEntry {
    /// Id of the envelope this entry was built from.
    pub envelope_id: String,
    pub source: String,
    pub detail_type: String,
    /// Detail serialized to JSON text.
    pub detail: String,
}

impl EventEntry {
    /// Builds the wire entry for an envelope.
    pub fn from_envelope(envelope: &EventEnvelope) -> EventResult<Self> {
        Ok(Self {
            envelope_id: envelope.id().to_string(),
            source: envelope.source().to_string(),
            detail_type: envelope.detail_type().to_string(),
            detail: serde_json::to_string(envelope.detail())?,
        })
    }

    /// Entry size as the bus accounts it: source, type, and detail bytes.
    pub fn size_bytes(&self) -> usize {
        self.source.len() + self.detail_type.len() + self.detail.len()
    }
}

/// Per-entry outcome of a batch submission, in entry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryDisposition {
    /// The bus accepted the entry and assigned it an id.
    Accepted { event_id: String },
    /// The bus rejected the entry.
    Rejected { code: String, message: String },
}

impl EntryDisposition {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// A bus that accepts batches of event entries.
///
/// Implementations are shared across requests behind an `Arc`, so methods
/// take `&self` and must be safe to call concurrently.
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Name of the bus, for logs and metrics.
    fn name(&self) -> &str;

    /// Submits a batch, returning one disposition per entry in order.
    ///
    /// `Err` means the call failed as a whole (connectivity, throttling) and
    /// may be retried. A mix of accepted and rejected entries is reported
    /// through the dispositions, not as an `Err`.
    async fn send_batch(&self, entries: Vec<EventEntry>) -> EventResult<Vec<EntryDisposition>>;

    /// Per-entry size limit in bytes.
    fn max_entry_bytes(&self) -> usize {
        DEFAULT_MAX_ENTRY_BYTES
    }
}
