//! # Formbridge Events
//!
//! Event pipeline for Formbridge providing:
//! - Envelopes wrapping domain events with ids, timestamps, and routing keys
//! - Batch publishing to a bus transport with partial-failure reporting
//! - Rule-based routing on exact (source, type) pairs
//! - Concurrent handler fan-out with per-handler isolation
//!
//! ## Example
//!
//! ```rust,ignore
//! use formbridge_events::{
//!     DeliveryPipeline, EventEnvelope, EventRouter, HandlerInvoker, InMemoryBus, RoutingRule,
//! };
//! use std::sync::Arc;
//!
//! let bus = Arc::new(InMemoryBus::new("backoffice-event-bus"));
//! let router = EventRouter::new().rule(RoutingRule::new(
//!     "form-submission-rule",
//!     "backoffice.forms",
//!     "FormSubmitted",
//!     "submission-processor",
//! ));
//! let pipeline = DeliveryPipeline::new(bus, router, handlers);
//!
//! let envelope = EventEnvelope::new(
//!     "backoffice.forms",
//!     "FormSubmitted",
//!     serde_json::json!({ "formId": "contact" }),
//! );
//! let report = pipeline.execute(&envelope).await?;
//! ```

mod dispatcher;
mod envelope;
mod error;
mod handler;
mod memory;
mod pipeline;
mod publisher;
mod router;
mod transport;

pub mod metrics;

pub use dispatcher::{DispatchReport, DispatchStatus, HandlerInvoker, HandlerOutcome};
pub use envelope::EventEnvelope;
pub use error::{EventError, EventResult, FailedEntry};
pub use handler::{BoxedHandler, EventHandler, FnHandler, HandlerResponse};
#[cfg(feature = "http-client")]
pub use handler::HttpHandler;
pub use memory::InMemoryBus;
pub use pipeline::{DeliveryPipeline, PipelineReport, PipelineStatus};
pub use publisher::{EventPublisher, PublishReceipt};
pub use router::{EventRouter, RoutingRule, UnmatchedPolicy};
pub use transport::{BusTransport, EntryDisposition, EventEntry, DEFAULT_MAX_ENTRY_BYTES};
