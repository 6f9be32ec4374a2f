//! # Formbridge Service
//!
//! Form intake for the backoffice platform:
//! - Validate submissions against named schemas
//! - Publish validated payloads as events on a bus
//! - Route published events to handlers and report every outcome
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use formbridge_service::{FormService, IntakeResponse, ReceiptKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = FormService::standard()?;
//!
//!     let receipt = service
//!         .submit_form(
//!             "contactForm",
//!             &serde_json::json!({
//!                 "name": "Alice",
//!                 "email": "alice@example.com",
//!                 "message": "Hello",
//!             }),
//!         )
//!         .await?;
//!
//!     let response = IntakeResponse::from_receipt(&receipt);
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;

mod response;
mod service;

pub use config::{ConfigError, ServiceConfig, load_config};
pub use response::{IntakeError, IntakeReceipt, IntakeResponse, ReceiptKind};
pub use service::{FormService, FormServiceBuilder};

// The building blocks, for callers assembling a custom service.
pub use formbridge_events::{
    BusTransport, DeliveryPipeline, EventEnvelope, EventHandler, FnHandler, HandlerResponse,
    InMemoryBus, PipelineReport, PipelineStatus, RoutingRule, UnmatchedPolicy,
};
pub use formbridge_forms::{
    FieldFormat, FieldKind, FieldSpec, FormSchema, SchemaSummary, ValidationError, ViolationCode,
};
