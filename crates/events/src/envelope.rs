//! Event envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable domain event.
///
/// Fields are private and exposed through accessors only, so an envelope can
/// never change after creation; handlers and transports all see the same
/// event. Ids are UUIDv7, so they sort roughly by creation time.
///
/// Serializes with camelCase keys and `detail_type` as `"type"`, matching the
/// wire contract of the bus:
/// `{"id", "source", "type", "detail", "createdAt"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    id: String,
    source: String,
    #[serde(rename = "type")]
    detail_type: String,
    detail: Value,
    created_at: DateTime<Utc>,
}

impl EventEnvelope {
    /// Creates a new envelope around a detail payload.
    ///
    /// Never fails; an unserializable detail becomes `null`. Emptiness of
    /// source and type is checked by the publisher, the way the bus itself
    /// would.
    pub fn new(
        source: impl Into<String>,
        detail_type: impl Into<String>,
        detail: impl Serialize,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            source: source.into(),
            detail_type: detail_type.into(),
            detail: serde_json::to_value(detail).unwrap_or(Value::Null),
            created_at: Utc::now(),
        }
    }

    /// Unique, time-ordered id of this event instance.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Logical origin, e.g. "backoffice.forms".
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Event classification, e.g. "FormSubmitted".
    pub fn detail_type(&self) -> &str {
        &self.detail_type
    }

    /// The event payload.
    pub fn detail(&self) -> &Value {
        &self.detail
    }

    /// When the envelope was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks whether this envelope has exactly the given source and type.
    pub fn matches(&self, source: &str, detail_type: &str) -> bool {
        self.source == source && self.detail_type == detail_type
    }
}
