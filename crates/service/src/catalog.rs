//! Standard backoffice catalog: schemas, rules and handlers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use formbridge_events::{
    EventEnvelope, EventHandler, EventResult, HandlerResponse, RoutingRule,
};
use formbridge_forms::{FieldFormat, FieldSpec, FormSchema};

/// Standard backoffice sources and detail types.
pub mod backoffice {
    /// Source for form intake events.
    pub const FORMS_SOURCE: &str = "backoffice.forms";
    /// Source for data processing events.
    pub const DATA_SOURCE: &str = "backoffice.data";
    /// Detail type emitted when a form is submitted.
    pub const FORM_SUBMITTED: &str = "FormSubmitted";
    /// Detail type emitted when validation is requested.
    pub const FORM_VALIDATION_REQUESTED: &str = "FormValidationRequested";
    /// Detail type emitted when data processing is required.
    pub const DATA_PROCESSING_REQUIRED: &str = "DataProcessingRequired";
    /// Default bus name.
    pub const BUS_NAME: &str = "backoffice-event-bus";
}

/// The standard intake schemas.
pub fn standard_schemas() -> Vec<FormSchema> {
    vec![user_registration_schema(), contact_form_schema()]
}

/// Registration form: names, email, and a role defaulting to "user".
pub fn user_registration_schema() -> FormSchema {
    FormSchema::new("userRegistration", "User Registration")
        .field(FieldSpec::text("firstName").title("First Name").min_length(2))
        .field(FieldSpec::text("lastName").title("Last Name").min_length(2))
        .field(FieldSpec::text("email").title("Email").format(FieldFormat::Email))
        .field(
            FieldSpec::number("age")
                .title("Age")
                .minimum(18.0)
                .maximum(120.0)
                .optional(),
        )
        .field(
            FieldSpec::choice("role", ["admin", "user", "viewer"])
                .title("Role")
                .default("user"),
        )
        .field(FieldSpec::text("bio").title("Bio").max_length(500).optional())
}

/// Contact form: name, email and message, with an urgency flag.
pub fn contact_form_schema() -> FormSchema {
    FormSchema::new("contactForm", "Contact Form")
        .field(FieldSpec::text("name").title("Name"))
        .field(FieldSpec::text("email").title("Email").format(FieldFormat::Email))
        .field(FieldSpec::text("subject").title("Subject").optional())
        .field(FieldSpec::text("message").title("Message"))
        .field(FieldSpec::boolean("urgent").title("Urgent").default(false))
}

/// The standard routing rules, one per intake operation.
pub fn standard_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule::new(
            "backoffice-form-submission-rule",
            backoffice::FORMS_SOURCE,
            backoffice::FORM_SUBMITTED,
            "backoffice-form-submission-handler",
        ),
        RoutingRule::new(
            "backoffice-form-validation-rule",
            backoffice::FORMS_SOURCE,
            backoffice::FORM_VALIDATION_REQUESTED,
            "backoffice-form-validation-handler",
        ),
        RoutingRule::new(
            "backoffice-data-processing-rule",
            backoffice::DATA_SOURCE,
            backoffice::DATA_PROCESSING_REQUIRED,
            "backoffice-data-processing-handler",
        ),
    ]
}

/// The standard handlers matching [`standard_rules`].
pub fn standard_handlers() -> Vec<Arc<dyn EventHandler>> {
    vec![
        Arc::new(FormSubmissionHandler),
        Arc::new(FormValidationHandler),
        Arc::new(DataProcessingHandler),
    ]
}

/// Acknowledges a submitted form, echoing its submission id.
pub struct FormSubmissionHandler;

#[async_trait]
impl EventHandler for FormSubmissionHandler {
    fn id(&self) -> &str {
        "backoffice-form-submission-handler"
    }

    async fn invoke(&self, envelope: &EventEnvelope) -> EventResult<HandlerResponse> {
        let submission_id = envelope
            .detail()
            .get("submissionId")
            .and_then(Value::as_str)
            .unwrap_or("generated-id");

        tracing::info!(
            event_id = %envelope.id(),
            submission_id = %submission_id,
            "Processing form submission"
        );

        Ok(HandlerResponse::ok(json!({
            "message": "Form submission processed successfully",
            "submissionId": submission_id,
        })))
    }
}

/// Reports a validation result for an already-validated payload.
pub struct FormValidationHandler;

#[async_trait]
impl EventHandler for FormValidationHandler {
    fn id(&self) -> &str {
        "backoffice-form-validation-handler"
    }

    async fn invoke(&self, envelope: &EventEnvelope) -> EventResult<HandlerResponse> {
        tracing::info!(event_id = %envelope.id(), "Validating form data");

        // Intake validation already ran; this stage is for business
        // checks layered on top, which is why the result carries a
        // warnings list alongside errors.
        Ok(HandlerResponse::ok(json!({
            "message": "Form validation completed",
            "result": {
                "isValid": true,
                "errors": [],
                "warnings": [],
            },
        })))
    }
}

/// Acknowledges a data processing request, echoing its record count.
pub struct DataProcessingHandler;

#[async_trait]
impl EventHandler for DataProcessingHandler {
    fn id(&self) -> &str {
        "backoffice-data-processing-handler"
    }

    async fn invoke(&self, envelope: &EventEnvelope) -> EventResult<HandlerResponse> {
        let record_count = envelope
            .detail()
            .get("recordCount")
            .and_then(Value::as_u64)
            .unwrap_or(0);

        tracing::info!(
            event_id = %envelope.id(),
            record_count = record_count,
            "Processing data"
        );

        Ok(HandlerResponse::ok(json!({
            "message": "Data processing completed successfully",
            "processedRecords": record_count,
        })))
    }
}
