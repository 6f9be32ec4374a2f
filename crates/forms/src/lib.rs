//! # Formbridge Forms
//!
//! Schema model and validation for form intake:
//! - Field specifications with per-kind constraints
//! - Named schemas with a JSON-Schema-like introspection document
//! - A registry populated at startup and shared read-only
//! - Collect-all validation that reports every violation at once
//!
//! ## Example
//!
//! ```rust
//! use formbridge_forms::{FieldFormat, FieldSpec, FormSchema, validate_payload};
//!
//! let schema = FormSchema::new("contactForm", "Contact Form")
//!     .field(FieldSpec::text("name"))
//!     .field(FieldSpec::text("email").format(FieldFormat::Email))
//!     .field(FieldSpec::boolean("urgent").default(false));
//!
//! let payload = serde_json::json!({ "name": "Jo", "email": "jo@x.com" });
//! let validated = validate_payload(&schema, &payload).unwrap();
//! assert_eq!(validated.get("urgent"), Some(&serde_json::json!(false)));
//! ```

mod error;
mod field;
mod registry;
mod schema;
mod validator;

pub use error::{FormError, FormResult};
pub use field::{FieldFormat, FieldKind, FieldSpec};
pub use registry::SchemaRegistry;
pub use schema::{FormSchema, SchemaSummary};
pub use validator::{
    ValidatedPayload, ValidationError, Validator, ViolationCode, validate_payload,
};
