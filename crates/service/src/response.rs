//! Intake receipts, wire responses, and the service error type.

use serde::Serialize;

use formbridge_events::{EventError, PipelineReport};
use formbridge_forms::{FormError, ValidationError};

/// Which intake operation produced a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptKind {
    /// `submit_form`.
    Submission,
    /// `request_validation`.
    Validation,
    /// `process_data`.
    Processing,
}

/// Receipt for an accepted intake call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeReceipt {
    /// Operation-scoped id, e.g. `submission-<uuid>`.
    pub id: String,
    /// Which operation ran.
    pub kind: ReceiptKind,
    /// Delivery report for the published envelope.
    pub report: PipelineReport,
}

/// Error from an intake operation.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// Schema or validation failure, before anything was published.
    #[error(transparent)]
    Form(#[from] FormError),
    /// Publish or delivery failure, after validation passed.
    #[error(transparent)]
    Event(#[from] EventError),
}

impl IntakeError {
    /// Maps the error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Form(e) => e.status_code(),
            Self::Event(e) => e.status_code(),
        }
    }

    /// Checks whether retrying the call might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Event(e) if e.is_retryable())
    }
}

/// Serializable wire form of an intake result.
///
/// Matches the backoffice API contract: `success` and `message` always,
/// the operation's id on success, and `errors`/`error` on failure. An
/// HTTP collaborator can serialize this verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeResponse {
    /// Whether the call was accepted.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// Submission id, present for accepted submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    /// Validation id, present for accepted validation requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_id: Option<String>,
    /// Processing id, present for accepted processing requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_id: Option<String>,
    /// Field violations, present when validation rejected the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
    /// Error description, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntakeResponse {
    /// Builds the success wire form for a receipt.
    pub fn from_receipt(receipt: &IntakeReceipt) -> Self {
        let (message, submission_id, validation_id, processing_id) = match receipt.kind {
            ReceiptKind::Submission => (
                "Form submitted successfully",
                Some(receipt.id.clone()),
                None,
                None,
            ),
            ReceiptKind::Validation => (
                "Form validation requested",
                None,
                Some(receipt.id.clone()),
                None,
            ),
            ReceiptKind::Processing => (
                "Data processing requested",
                None,
                None,
                Some(receipt.id.clone()),
            ),
        };

        Self {
            success: true,
            message: message.to_string(),
            submission_id,
            validation_id,
            processing_id,
            errors: None,
            error: None,
        }
    }

    /// Builds the failure wire form for an error.
    pub fn from_error(kind: ReceiptKind, error: &IntakeError) -> Self {
        let message = match kind {
            ReceiptKind::Submission => "Failed to submit form",
            ReceiptKind::Validation => "Failed to validate form",
            ReceiptKind::Processing => "Failed to process data",
        };

        let errors = match error {
            IntakeError::Form(FormError::Validation { errors, .. }) => Some(errors.clone()),
            _ => None,
        };

        Self {
            success: false,
            message: message.to_string(),
            submission_id: None,
            validation_id: None,
            processing_id: None,
            errors,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formbridge_events::PipelineStatus;

    fn report() -> PipelineReport {
        PipelineReport {
            envelope_id: "evt-1".to_string(),
            status: PipelineStatus::Success,
            receipt: None,
            dispatch: None,
        }
    }

    #[test]
    fn test_submission_response_wire_shape() {
        let receipt = IntakeReceipt {
            id: "submission-abc".to_string(),
            kind: ReceiptKind::Submission,
            report: report(),
        };
        let value = serde_json::to_value(IntakeResponse::from_receipt(&receipt)).unwrap();

        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Form submitted successfully");
        assert_eq!(value["submissionId"], "submission-abc");
        assert!(value.get("validationId").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_processing_response_uses_processing_id() {
        let receipt = IntakeReceipt {
            id: "processing-xyz".to_string(),
            kind: ReceiptKind::Processing,
            report: report(),
        };
        let response = IntakeResponse::from_receipt(&receipt);

        assert_eq!(response.message, "Data processing requested");
        assert_eq!(response.processing_id.as_deref(), Some("processing-xyz"));
        assert!(response.submission_id.is_none());
    }

    #[test]
    fn test_validation_failure_lists_violations() {
        use formbridge_forms::{ValidationError, ViolationCode};

        let error = IntakeError::Form(FormError::validation(
            "contactForm",
            vec![ValidationError::new(
                "email",
                ViolationCode::Format,
                "Invalid format: expected email",
            )],
        ));
        let value =
            serde_json::to_value(IntakeResponse::from_error(ReceiptKind::Submission, &error))
                .unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["message"], "Failed to submit form");
        assert_eq!(value["errors"][0]["field"], "email");
        assert!(value.get("submissionId").is_none());
    }

    #[test]
    fn test_status_codes_pass_through() {
        let not_found = IntakeError::Form(FormError::not_found("ghost"));
        assert_eq!(not_found.status_code(), 404);
        assert!(!not_found.is_retryable());

        let transport = IntakeError::Event(EventError::transport("connection refused"));
        assert_eq!(transport.status_code(), 503);
        assert!(transport.is_retryable());
    }
}
