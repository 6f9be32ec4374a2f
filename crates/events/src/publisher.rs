//! Batch publishing with partial-failure reporting.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;

use crate::envelope::EventEnvelope;
use crate::error::{EventError, EventResult, FailedEntry};
use crate::metrics::{EVENTS_PUBLISHED, PUBLISH_FAILURES};
use crate::transport::{BusTransport, EntryDisposition, EventEntry};

/// Receipt for a fully accepted batch.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReceipt {
    /// Bus-assigned ids, one per envelope in submission order.
    pub event_ids: Vec<String>,
}

impl PublishReceipt {
    /// Number of accepted entries.
    pub fn count(&self) -> usize {
        self.event_ids.len()
    }
}

/// Publishes envelopes to a bus transport.
///
/// Every envelope is checked before the transport sees it: source and type
/// must be non-empty and the serialized detail must fit the transport's
/// per-entry limit. The whole batch goes out in one transport call, and any
/// per-entry rejection fails the call with the rejected entries listed,
/// even when siblings were accepted. The publisher never retries; transport
/// errors are surfaced as retryable for the caller to decide.
pub struct EventPublisher {
    transport: Arc<dyn BusTransport>,
}

impl EventPublisher {
    /// Creates a publisher over a shared transport.
    pub fn new(transport: Arc<dyn BusTransport>) -> Self {
        Self { transport }
    }

    /// Publishes a single envelope.
    pub async fn publish(&self, envelope: &EventEnvelope) -> EventResult<PublishReceipt> {
        self.publish_batch(std::slice::from_ref(envelope)).await
    }

    /// Publishes a batch of envelopes in one transport call.
    pub async fn publish_batch(&self, envelopes: &[EventEnvelope]) -> EventResult<PublishReceipt> {
        if envelopes.is_empty() {
            return Ok(PublishReceipt {
                event_ids: Vec::new(),
            });
        }

        let limit = self.transport.max_entry_bytes();
        let mut entries = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            entries.push(prepare_entry(envelope, limit)?);
        }

        let dispositions = self.transport.send_batch(entries).await?;

        let attempted = envelopes.len();
        if dispositions.len() != attempted {
            return Err(EventError::internal(format!(
                "Transport returned {} dispositions for {} entries",
                dispositions.len(),
                attempted
            )));
        }

        let mut event_ids = Vec::with_capacity(attempted);
        let mut failed = Vec::new();
        for (envelope, disposition) in envelopes.iter().zip(dispositions) {
            match disposition {
                EntryDisposition::Accepted { event_id } => event_ids.push(event_id),
                EntryDisposition::Rejected { code, message } => failed.push(FailedEntry {
                    envelope_id: envelope.id().to_string(),
                    code,
                    message,
                }),
            }
        }

        if failed.is_empty() {
            counter!(EVENTS_PUBLISHED).increment(attempted as u64);
            tracing::info!(
                bus = %self.transport.name(),
                count = attempted,
                "Published batch"
            );
            Ok(PublishReceipt { event_ids })
        } else {
            counter!(PUBLISH_FAILURES).increment(failed.len() as u64);
            tracing::warn!(
                bus = %self.transport.name(),
                attempted,
                rejected = failed.len(),
                "Bus rejected entries"
            );
            Err(EventError::partial(attempted, failed))
        }
    }
}

fn prepare_entry(envelope: &EventEnvelope, limit: usize) -> EventResult<EventEntry> {
    if envelope.source().is_empty() {
        return Err(EventError::invalid_envelope(format!(
            "Envelope {} has an empty source",
            envelope.id()
        )));
    }
    if envelope.detail_type().is_empty() {
        return Err(EventError::invalid_envelope(format!(
            "Envelope {} has an empty type",
            envelope.id()
        )));
    }

    let entry = EventEntry::from_envelope(envelope)?;
    let size = entry.size_bytes();
    if size > limit {
        return Err(EventError::oversized(envelope.id(), size, limit));
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBus;
    use async_trait::async_trait;
    use serde_json::json;

    fn envelope(detail_type: &str) -> EventEnvelope {
        EventEnvelope::new("backoffice.forms", detail_type, json!({"k": "v"}))
    }

    /// Rejects entries of one detail type, accepts the rest.
    struct RejectingTransport {
        rejected_type: String,
    }

    #[async_trait]
    impl BusTransport for RejectingTransport {
        fn name(&self) -> &str {
            "rejecting-bus"
        }

        async fn send_batch(&self, entries: Vec<EventEntry>) -> EventResult<Vec<EntryDisposition>> {
            Ok(entries
                .into_iter()
                .map(|entry| {
                    if entry.detail_type == self.rejected_type {
                        EntryDisposition::Rejected {
                            code: "InternalFailure".into(),
                            message: "simulated rejection".into(),
                        }
                    } else {
                        EntryDisposition::Accepted {
                            event_id: entry.envelope_id,
                        }
                    }
                })
                .collect())
        }
    }

    /// Fails every call outright.
    struct DownTransport;

    #[async_trait]
    impl BusTransport for DownTransport {
        fn name(&self) -> &str {
            "down-bus"
        }

        async fn send_batch(&self, _: Vec<EventEntry>) -> EventResult<Vec<EntryDisposition>> {
            Err(EventError::transport("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_publish_batch_success() {
        let bus = Arc::new(InMemoryBus::new("backoffice-event-bus"));
        let publisher = EventPublisher::new(bus.clone());

        let receipt = publisher
            .publish_batch(&[envelope("FormSubmitted"), envelope("FormSubmitted")])
            .await
            .unwrap();

        assert_eq!(receipt.count(), 2);
        assert_eq!(bus.accepted_count().await, 2);
    }

    #[tokio::test]
    async fn test_partial_failure_lists_rejected_entries() {
        let publisher = EventPublisher::new(Arc::new(RejectingTransport {
            rejected_type: "DataProcessingRequired".into(),
        }));

        let good = envelope("FormSubmitted");
        let bad = EventEnvelope::new("backoffice.data", "DataProcessingRequired", json!({}));
        let also_good = envelope("FormValidationRequested");

        let err = publisher
            .publish_batch(&[good, bad.clone(), also_good])
            .await
            .unwrap_err();

        match err {
            EventError::PartialPublish { attempted, failed } => {
                assert_eq!(attempted, 3);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].envelope_id, bad.id());
                assert_eq!(failed[0].code, "InternalFailure");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_retryable() {
        let publisher = EventPublisher::new(Arc::new(DownTransport));

        let err = publisher.publish(&envelope("FormSubmitted")).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, EventError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_oversized_entry_never_reaches_the_transport() {
        let bus = Arc::new(InMemoryBus::new("tiny-bus").with_max_entry_bytes(16));
        let publisher = EventPublisher::new(bus.clone());

        let big = EventEnvelope::new(
            "backoffice.forms",
            "FormSubmitted",
            json!({"formData": "x".repeat(64)}),
        );

        let err = publisher.publish(&big).await.unwrap_err();
        assert!(matches!(err, EventError::OversizedEntry { .. }));
        assert_eq!(bus.accepted_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_source_is_rejected_before_the_transport() {
        let bus = Arc::new(InMemoryBus::new("backoffice-event-bus"));
        let publisher = EventPublisher::new(bus.clone());

        let err = publisher
            .publish(&EventEnvelope::new("", "FormSubmitted", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::InvalidEnvelope { .. }));
        assert_eq!(bus.accepted_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let bus = Arc::new(InMemoryBus::new("backoffice-event-bus"));
        let publisher = EventPublisher::new(bus.clone());

        let receipt = publisher.publish_batch(&[]).await.unwrap();
        assert_eq!(receipt.count(), 0);
        assert_eq!(bus.accepted_count().await, 0);
    }
}
